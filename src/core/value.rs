use serde_json::Value;

use crate::core::{slot::CanonicalSlot, tariff::TariffType};

/// Unit that disambiguates itemized and flat price fields.
const CHF_PER_KWH: &str = "CHF/kWh";

/// Component tag assumed when a flat-priced slot names none.
const WORK_COMPONENT: &str = "work";

impl CanonicalSlot {
    /// Resolve the single applicable price for the tariff type and optional
    /// component filter.
    ///
    /// Probes, in order: the flat `value` field (unfiltered only), the
    /// itemized list under the tariff-type key, and the slot's own top-level
    /// `unit`/`component` pair. The same logical price can be shipped flat,
    /// itemized, or both; first match wins so it is never double-counted.
    #[must_use]
    pub fn price(&self, tariff_type: TariffType, component: Option<&str>) -> Option<f64> {
        if component.is_none()
            && let Some(value) = self.get("value").and_then(Value::as_f64)
        {
            return Some(value);
        }
        if let Some(Value::Array(prices)) = self.get(tariff_type.as_str())
            && let Some(value) = itemized_price(prices, component)
        {
            return Some(value);
        }
        self.own_price(component)
    }

    /// Price from the slot's own top-level `unit`, `component` and `value`.
    fn own_price(&self, component: Option<&str>) -> Option<f64> {
        if self.get("unit").and_then(Value::as_str) != Some(CHF_PER_KWH) {
            return None;
        }
        let own_component = self.get("component").filter(|value| !value.is_null());
        let matches = match component {
            None => own_component.is_none_or(|own| own.as_str() == Some(WORK_COMPONENT)),
            Some(component) => own_component.is_some_and(|own| own.as_str() == Some(component)),
        };
        if matches { self.get("value").and_then(Value::as_f64) } else { None }
    }
}

/// First eligible itemized record, preferring the `CHF/kWh` unit.
fn itemized_price(prices: &[Value], component: Option<&str>) -> Option<f64> {
    let mut fallback = None;
    for price in prices.iter().filter_map(Value::as_object) {
        if let Some(component) = component
            && price.get("component").and_then(Value::as_str) != Some(component)
        {
            continue;
        }
        let Some(value) = price.get("value").and_then(Value::as_f64) else {
            continue;
        };
        if price.get("unit").and_then(Value::as_str) == Some(CHF_PER_KWH) {
            return Some(value);
        }
        fallback = fallback.or(Some(value));
    }
    fallback
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::core::normalize::normalize_slots;

    fn slot(record: Value) -> CanonicalSlot {
        let window_end = Local.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap();
        normalize_slots(&[record], window_end).pop().unwrap()
    }

    #[test]
    fn test_flat_value_without_filter() {
        let slot = slot(json!({"value": 0.25}));
        assert_eq!(slot.price(TariffType::Electricity, None), Some(0.25));
    }

    #[test]
    fn test_flat_value_is_ignored_under_component_filter() {
        let slot = slot(json!({"value": 0.25}));
        assert_eq!(slot.price(TariffType::Electricity, Some("work")), None);
    }

    #[test]
    fn test_itemized_prefers_canonical_unit() {
        let slot = slot(json!({
            "electricity": [
                {"component": "work", "unit": "ct/kWh", "value": 25.0},
                {"component": "work", "unit": "CHF/kWh", "value": 0.25},
            ],
        }));
        assert_eq!(slot.price(TariffType::Electricity, None), Some(0.25));
    }

    #[test]
    fn test_itemized_falls_back_to_first_priced_record() {
        let slot = slot(json!({
            "electricity": [
                {"component": "work", "unit": "ct/kWh", "value": null},
                {"component": "work", "unit": "ct/kWh", "value": 25.0},
                {"component": "work", "unit": "ct/kWh", "value": 30.0},
            ],
        }));
        assert_eq!(slot.price(TariffType::Electricity, None), Some(25.0));
    }

    #[test]
    fn test_itemized_component_filter() {
        let slot = slot(json!({
            "grid": [
                {"component": "work", "unit": "CHF/kWh", "value": 0.10},
                {"component": "grid-fee", "unit": "CHF/kWh", "value": 0.05},
            ],
        }));
        assert_eq!(slot.price(TariffType::Grid, Some("grid-fee")), Some(0.05));
        assert_eq!(slot.price(TariffType::Grid, Some("metering")), None);
        // Filtered and unfiltered resolution agree when the first itemized
        // record is the unambiguous one.
        assert_eq!(slot.price(TariffType::Grid, None), slot.price(TariffType::Grid, Some("work")));
    }

    #[test]
    fn test_itemized_skips_non_object_records() {
        let slot = slot(json!({"electricity": [42, {"unit": "CHF/kWh", "value": 0.25}]}));
        assert_eq!(slot.price(TariffType::Electricity, None), Some(0.25));
    }

    #[test]
    fn test_itemized_list_under_other_tariff_key_is_ignored() {
        let slot = slot(json!({
            "electricity": [{"component": "work", "unit": "CHF/kWh", "value": 0.25}],
        }));
        assert_eq!(slot.price(TariffType::Grid, None), None);
    }

    #[test]
    fn test_own_pair_requires_component_presence_under_filter() {
        let slot = slot(json!({"unit": "CHF/kWh", "value": 0.25, "component": null}));
        assert_eq!(slot.price(TariffType::Electricity, Some("work")), None);
    }

    #[test]
    fn test_own_work_component_matches_default_filter() {
        let slot = slot(json!({"unit": "CHF/kWh", "component": "work", "value": 0.25}));
        assert_eq!(slot.price(TariffType::Electricity, Some("work")), Some(0.25));
    }

    #[test]
    fn test_flat_value_wins_over_own_component_when_unfiltered() {
        let slot = slot(json!({"unit": "CHF/kWh", "component": "grid-fee", "value": 0.25}));
        assert_eq!(slot.price(TariffType::Electricity, None), Some(0.25));
    }

    #[test]
    fn test_own_component_exact_match_under_filter() {
        let slot = slot(json!({"unit": "CHF/kWh", "component": "grid-fee", "value": 0.25}));
        assert_eq!(slot.price(TariffType::Electricity, Some("grid-fee")), Some(0.25));
        assert_eq!(slot.price(TariffType::Electricity, Some("work")), None);
    }

    #[test]
    fn test_unresolvable_returns_none() {
        let slot = slot(json!({"note": "no price here"}));
        assert_eq!(slot.price(TariffType::Electricity, None), None);
        assert_eq!(slot.price(TariffType::Electricity, Some("work")), None);
    }
}
