use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::{
    core::{
        normalize::normalize_slots,
        slot::{CanonicalSlot, PriceSlot, price_slots},
        tariff::TariffType,
    },
    quantity::{rate::KilowattHourRate, time_range::TimeRange},
    statistics::rates::{self, DaySummary, Extreme, PriceWindow},
};

/// Immutable per-tariff snapshot of one refresh cycle.
///
/// Built once from the fetched records and then only read: every query is
/// pure, takes an explicit `now`, and returns `None` for missing or
/// unresolvable data, so "nothing" stays distinguishable from zero.
pub struct TariffSnapshot {
    tariff_type: TariffType,
    slots: Vec<CanonicalSlot>,
}

impl TariffSnapshot {
    #[must_use]
    pub fn from_records(
        tariff_type: TariffType,
        records: &[Value],
        window_end: DateTime<Local>,
    ) -> Self {
        Self { tariff_type, slots: normalize_slots(records, window_end) }
    }

    #[must_use]
    pub const fn tariff_type(&self) -> TariffType {
        self.tariff_type
    }

    #[must_use]
    pub fn slots(&self) -> &[CanonicalSlot] {
        &self.slots
    }

    /// Typed projection for this tariff type and optional component filter.
    ///
    /// Recomputed per query; cheap next to the refresh interval.
    #[must_use]
    pub fn price_slots(&self, component: Option<&str>) -> Vec<PriceSlot> {
        price_slots(&self.slots, self.tariff_type, component)
    }

    #[must_use]
    pub fn current_slot(&self, now: DateTime<Local>) -> Option<&CanonicalSlot> {
        rates::find_current_slot(&self.slots, now)
    }

    #[must_use]
    pub fn current_price(
        &self,
        now: DateTime<Local>,
        component: Option<&str>,
    ) -> Option<KilowattHourRate> {
        self.current_slot(now)?.price(self.tariff_type, component).map(Into::into)
    }

    /// End of the current slot.
    #[must_use]
    pub fn next_change(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.current_slot(now)?.end()
    }

    #[must_use]
    pub fn day_average(
        &self,
        now: DateTime<Local>,
        offset_days: i64,
        component: Option<&str>,
    ) -> Option<KilowattHourRate> {
        let day = TimeRange::local_day(now, offset_days)?;
        rates::average_price_for_window(&self.price_slots(component), day)
    }

    #[must_use]
    pub fn day_summary(
        &self,
        now: DateTime<Local>,
        offset_days: i64,
        component: Option<&str>,
    ) -> Option<DaySummary> {
        let day = TimeRange::local_day(now, offset_days)?;
        rates::day_summary(&self.price_slots(component), day)
    }

    #[must_use]
    pub fn extreme_window(
        &self,
        now: DateTime<Local>,
        offset_days: i64,
        window_size: usize,
        extreme: Extreme,
        component: Option<&str>,
    ) -> Option<PriceWindow> {
        let day = TimeRange::local_day(now, offset_days)?;
        rates::window_extreme(&self.price_slots(component), day, window_size, extreme)
    }

    /// Whether `now` falls inside today's extreme window of the given size,
    /// window bounds inclusive.
    #[must_use]
    pub fn is_in_extreme_window(
        &self,
        now: DateTime<Local>,
        window_size: usize,
        extreme: Extreme,
        component: Option<&str>,
    ) -> Option<bool> {
        let window = self.extreme_window(now, 0, window_size, extreme, component)?;
        Some(window.contains(now))
    }

    /// Whether the current slot belongs to today's cheapest
    /// (`highest = false`) or most expensive (`highest = true`) value
    /// fraction.
    #[must_use]
    pub fn is_in_percentile(
        &self,
        now: DateTime<Local>,
        percentile: f64,
        highest: bool,
        component: Option<&str>,
    ) -> Option<bool> {
        let day = TimeRange::local_day(now, 0)?;
        let day_slots: Vec<PriceSlot> = self
            .price_slots(component)
            .into_iter()
            .filter(|slot| day.contains(slot.start))
            .collect();
        let current = rates::current_price_slot(&day_slots, now)?.value;
        let values: Vec<KilowattHourRate> = day_slots.iter().map(|slot| slot.value).collect();
        let threshold = rates::percentile_threshold(&values, percentile, highest)?;
        Some(if highest { current >= threshold } else { current <= threshold })
    }

    /// Distinct component tags across itemized lists and the slots themselves.
    #[must_use]
    pub fn components(&self) -> BTreeSet<String> {
        let mut components = BTreeSet::new();
        for slot in &self.slots {
            if let Some(Value::Array(prices)) = slot.get(self.tariff_type.as_str()) {
                for price in prices.iter().filter_map(Value::as_object) {
                    if let Some(component) = price.get("component").and_then(Value::as_str)
                        && !component.is_empty()
                    {
                        components.insert(component.to_owned());
                    }
                }
            }
            if let Some(component) = slot.get("component").and_then(Value::as_str)
                && !component.is_empty()
            {
                components.insert(component.to_owned());
            }
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, hour, minute, second).unwrap()
    }

    /// Four contiguous hourly slots from local midnight.
    fn snapshot(values: [f64; 4]) -> TariffSnapshot {
        let records: Vec<Value> = values
            .iter()
            .enumerate()
            .map(|(hour, value)| {
                json!({
                    "start": at(hour as u32, 0, 0).to_rfc3339(),
                    "value": value,
                })
            })
            .collect();
        TariffSnapshot::from_records(TariffType::Electricity, &records, at(3, 59, 59))
    }

    #[test]
    fn test_current_price_and_next_change() {
        let snapshot = snapshot([0.10, 0.20, 0.30, 0.40]);
        let now = at(1, 30, 0);
        assert_eq!(snapshot.current_price(now, None), Some(0.20.into()));
        assert_eq!(snapshot.next_change(now), Some(at(1, 59, 59)));
    }

    #[test]
    fn test_no_current_slot_outside_the_series() {
        let snapshot = snapshot([0.10, 0.20, 0.30, 0.40]);
        let now = at(12, 0, 0);
        assert_eq!(snapshot.current_price(now, None), None);
        assert_eq!(snapshot.next_change(now), None);
    }

    #[test]
    fn test_day_average_and_summary() {
        let snapshot = snapshot([0.10, 0.20, 0.30, 0.40]);
        let now = at(1, 30, 0);
        let average = snapshot.day_average(now, 0, None).unwrap();
        approx::assert_relative_eq!(average.as_f64(), 0.25, epsilon = 1e-9);

        let summary = snapshot.day_summary(now, 0, None).unwrap();
        assert_eq!(summary.slot_count, 4);
        assert_eq!(summary.min, 0.10.into());
        assert_eq!(summary.max, 0.40.into());

        assert_eq!(snapshot.day_average(now, 1, None), None);
        assert_eq!(snapshot.day_summary(now, 1, None), None);
    }

    #[test]
    fn test_extreme_window_membership() {
        let snapshot = snapshot([0.10, 0.30, 0.20, 0.40]);
        let cheap_now = at(0, 30, 0);
        assert_eq!(snapshot.is_in_extreme_window(cheap_now, 2, Extreme::Min, None), Some(true));
        assert_eq!(snapshot.is_in_extreme_window(cheap_now, 2, Extreme::Max, None), Some(false));

        let expensive_now = at(3, 30, 0);
        assert_eq!(snapshot.is_in_extreme_window(expensive_now, 2, Extreme::Max, None), Some(true));
        assert_eq!(snapshot.is_in_extreme_window(expensive_now, 5, Extreme::Max, None), None);
    }

    #[test]
    fn test_percentile_membership() {
        let snapshot = snapshot([0.10, 0.20, 0.30, 0.40]);
        let cheapest_now = at(0, 30, 0);
        assert_eq!(snapshot.is_in_percentile(cheapest_now, 0.25, false, None), Some(true));
        assert_eq!(snapshot.is_in_percentile(cheapest_now, 0.25, true, None), Some(false));

        let expensive_now = at(3, 30, 0);
        assert_eq!(snapshot.is_in_percentile(expensive_now, 0.25, true, None), Some(true));

        // No current slot means no membership, not `false`.
        assert_eq!(snapshot.is_in_percentile(at(12, 0, 0), 0.25, false, None), None);
    }

    #[test]
    fn test_components_are_discovered_from_both_shapes() {
        let records = [
            json!({
                "start": at(0, 0, 0).to_rfc3339(),
                "electricity": [
                    {"component": "work", "unit": "CHF/kWh", "value": 0.20},
                    {"component": "grid-fee", "unit": "CHF/kWh", "value": 0.05},
                ],
            }),
            json!({
                "start": at(1, 0, 0).to_rfc3339(),
                "unit": "CHF/kWh",
                "component": "metering",
                "value": 0.01,
            }),
        ];
        let snapshot =
            TariffSnapshot::from_records(TariffType::Electricity, &records, at(1, 59, 59));
        let components: Vec<String> = snapshot.components().into_iter().collect();
        assert_eq!(components, ["grid-fee", "metering", "work"]);
    }
}
