use chrono::{DateTime, Local, TimeDelta};
use itertools::Itertools;

use crate::{
    core::slot::{CanonicalSlot, PriceSlot},
    quantity::{rate::KilowattHourRate, time_range::TimeRange},
};

/// Which end of the price range a window search looks for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Extreme {
    Min,
    Max,
}

/// Contiguous run of slots with its unweighted mean price.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PriceWindow {
    pub average: KilowattHourRate,

    /// Start of the first slot, inclusive.
    pub start: DateTime<Local>,

    /// End of the last slot, inclusive.
    pub end: DateTime<Local>,
}

impl PriceWindow {
    #[must_use]
    pub fn contains(self, at: DateTime<Local>) -> bool {
        (self.start <= at) && (at <= self.end)
    }
}

/// Day-level distribution of slot prices.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DaySummary {
    pub min: KilowattHourRate,
    pub max: KilowattHourRate,
    pub average: KilowattHourRate,
    pub slot_count: usize,
}

/// First slot whose closed `[start, end]` interval contains `now`.
#[must_use]
pub fn find_current_slot(slots: &[CanonicalSlot], now: DateTime<Local>) -> Option<&CanonicalSlot> {
    slots.iter().find(|slot| slot.contains(now))
}

/// Same rule over the typed projection.
#[must_use]
pub fn current_price_slot(slots: &[PriceSlot], now: DateTime<Local>) -> Option<&PriceSlot> {
    slots.iter().find(|slot| (slot.start <= now) && (now <= slot.end))
}

/// Duration-weighted average price over the window.
///
/// Slot ends are inclusive, so a slot contributes through `end + 1 s`,
/// clipped to the window. `None` when no slot overlaps the window at all;
/// "nothing" is never reported as zero.
#[must_use]
pub fn average_price_for_window(
    slots: &[PriceSlot],
    window: TimeRange,
) -> Option<KilowattHourRate> {
    let mut weighted_sum = 0.0;
    let mut total_seconds = 0.0;
    for slot in slots {
        let start = slot.start.max(window.start);
        let end_exclusive = (slot.end + TimeDelta::seconds(1)).min(window.end);
        if start >= end_exclusive {
            continue;
        }
        let seconds = (end_exclusive - start).as_seconds_f64();
        weighted_sum += slot.value.as_f64() * seconds;
        total_seconds += seconds;
    }
    (total_seconds > 0.0).then(|| KilowattHourRate::from(weighted_sum / total_seconds))
}

/// Cheapest or most expensive run of `window_size` slots starting within
/// `day`.
///
/// A candidate is valid only when every consecutive pair satisfies
/// `previous.end + 1 s == next.start`; any gap disqualifies the candidate
/// entirely instead of penalizing it. Strict comparison keeps the first
/// extremum on ties.
#[must_use]
pub fn window_extreme(
    slots: &[PriceSlot],
    day: TimeRange,
    window_size: usize,
    extreme: Extreme,
) -> Option<PriceWindow> {
    if window_size == 0 {
        return None;
    }
    let day_slots: Vec<&PriceSlot> = slots.iter().filter(|slot| day.contains(slot.start)).collect();
    let mut best: Option<PriceWindow> = None;
    for window in day_slots.windows(window_size) {
        let contiguous = window
            .iter()
            .tuple_windows()
            .all(|(previous, next)| previous.end + TimeDelta::seconds(1) == next.start);
        if !contiguous {
            continue;
        }
        let average =
            window.iter().map(|slot| slot.value).sum::<KilowattHourRate>() / window_size as f64;
        let better = match best {
            None => true,
            Some(best) => match extreme {
                Extreme::Min => average < best.average,
                Extreme::Max => average > best.average,
            },
        };
        if better {
            best = Some(PriceWindow {
                average,
                start: window[0].start,
                end: window[window_size - 1].end,
            });
        }
    }
    best
}

/// Value separating the top (`highest`) or bottom fraction of `values`.
///
/// The slice holds `max(1, round(n × percentile))` values, ties rounding to
/// even; the count saturates at `n`. `None` for an empty input or a
/// non-positive percentile.
#[must_use]
pub fn percentile_threshold(
    values: &[KilowattHourRate],
    percentile: f64,
    highest: bool,
) -> Option<KilowattHourRate> {
    if values.is_empty() || percentile <= 0.0 {
        return None;
    }
    let count =
        ((values.len() as f64 * percentile).round_ties_even() as usize).clamp(1, values.len());
    let sorted: Vec<KilowattHourRate> = values.iter().copied().sorted().collect();
    Some(if highest { sorted[sorted.len() - count] } else { sorted[count - 1] })
}

/// Distribution of the slot values starting within `day`.
#[must_use]
pub fn day_summary(slots: &[PriceSlot], day: TimeRange) -> Option<DaySummary> {
    let values: Vec<KilowattHourRate> =
        slots.iter().filter(|slot| day.contains(slot.start)).map(|slot| slot.value).collect();
    let (min, max) = values.iter().copied().minmax().into_option()?;
    let average = values.iter().copied().sum::<KilowattHourRate>() / values.len() as f64;
    Some(DaySummary { min, max, average, slot_count: values.len() })
}
