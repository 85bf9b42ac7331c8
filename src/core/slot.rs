use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{core::tariff::TariffType, quantity::rate::KilowattHourRate};

/// Canonical key for the resolved slot start, a local-time ISO-8601 string.
pub const START_TIMESTAMP: &str = "start_timestamp";

/// Canonical key for the resolved slot end, a local-time ISO-8601 string.
pub const END_TIMESTAMP: &str = "end_timestamp";

/// Price slot with resolved boundaries.
///
/// Keeps every raw field so that value extraction can still inspect the
/// provider-specific shape. Boundaries are closed: a slot covers
/// `[start, end]` at one-second granularity, and either may stay unresolved;
/// consumers skip such slots.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct CanonicalSlot {
    fields: Map<String, Value>,

    #[serde(skip)]
    start: Option<DateTime<Local>>,

    #[serde(skip)]
    end: Option<DateTime<Local>>,
}

impl CanonicalSlot {
    /// Attach the resolved boundaries, mirroring them into the field map
    /// under the canonical keys.
    pub(crate) fn new(
        mut fields: Map<String, Value>,
        start: Option<DateTime<Local>>,
        end: Option<DateTime<Local>>,
    ) -> Self {
        if let Some(start) = start {
            fields.insert(START_TIMESTAMP.to_owned(), Value::String(start.to_rfc3339()));
        }
        if let Some(end) = end {
            fields.insert(END_TIMESTAMP.to_owned(), Value::String(end.to_rfc3339()));
        }
        Self { fields, start, end }
    }

    #[must_use]
    pub const fn start(&self) -> Option<DateTime<Local>> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Option<DateTime<Local>> {
        self.end
    }

    /// Both boundaries inclusive; `false` when either is unresolved.
    #[must_use]
    pub fn contains(&self, at: DateTime<Local>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (start <= at) && (at <= end),
            _ => false,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Typed `(start, end, value)` record consumed by all statistics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PriceSlot {
    /// Inclusive.
    pub start: DateTime<Local>,

    /// Inclusive.
    pub end: DateTime<Local>,

    pub value: KilowattHourRate,
}

/// Project canonical slots into typed price slots for one tariff type and
/// optional component, ascending by start.
///
/// Slots without resolvable boundaries or without a resolvable value are
/// dropped.
#[must_use]
pub fn price_slots(
    slots: &[CanonicalSlot],
    tariff_type: TariffType,
    component: Option<&str>,
) -> Vec<PriceSlot> {
    slots
        .iter()
        .filter_map(|slot| {
            Some(PriceSlot {
                start: slot.start()?,
                end: slot.end()?,
                value: slot.price(tariff_type, component)?.into(),
            })
        })
        .sorted_by_key(|slot| slot.start)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::core::normalize::normalize_slots;

    #[test]
    fn test_price_slots_sorts_and_drops_unresolvable() {
        let window_end = Local.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap();
        let records = [
            json!({
                "start_timestamp": "2024-01-15T11:00:00+01:00",
                "end_timestamp": "2024-01-15T11:59:59+01:00",
                "value": 0.30,
            }),
            json!({"value": 0.10}),
            json!({
                "start_timestamp": "2024-01-15T10:00:00+01:00",
                "end_timestamp": "2024-01-15T10:59:59+01:00",
                "value": 0.20,
            }),
        ];
        let slots = normalize_slots(&records, window_end);

        let priced = price_slots(&slots, TariffType::Electricity, None);
        assert_eq!(priced.len(), 2);
        assert!(priced[0].start < priced[1].start);
        assert_eq!(priced[0].value, 0.20.into());
        assert_eq!(priced[1].value, 0.30.into());
    }

    #[test]
    fn test_contains_is_inclusive_on_both_ends() {
        let window_end = Local.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap();
        let records = [json!({
            "start_timestamp": "2024-01-15T10:00:00+01:00",
            "end_timestamp": "2024-01-15T10:59:59+01:00",
        })];
        let slots = normalize_slots(&records, window_end);

        let slot = &slots[0];
        assert!(slot.contains(slot.start().unwrap()));
        assert!(slot.contains(slot.end().unwrap()));
        assert!(!slot.contains(slot.end().unwrap() + chrono::TimeDelta::seconds(1)));
    }
}
