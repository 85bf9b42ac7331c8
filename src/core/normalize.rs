use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use serde_json::{Map, Value};

use crate::core::slot::{CanonicalSlot, END_TIMESTAMP, START_TIMESTAMP};

/// Aliases under which the API has shipped the slot start, by priority.
const START_KEYS: [&str; 6] = [START_TIMESTAMP, "start", "start_time", "from", "timestamp", "time"];

/// Aliases under which the API has shipped the slot end, by priority.
const END_KEYS: [&str; 6] = [END_TIMESTAMP, "end", "end_time", "to", "valid_until", "finish"];

/// Millisecond epochs exceed this, second epochs do not.
const EPOCH_MILLIS_CUTOFF: f64 = 1e12;

/// Resolve the start and end of every raw slot record.
///
/// Starts and ends are probed independently over their key aliases. A slot
/// without its own end closes one second before the next resolvable start, or
/// at `window_end` when none follows, so the last slot of a fetch never stays
/// open-ended. Unresolvable boundaries stay absent and the record passes
/// through otherwise untouched.
pub fn normalize_slots(records: &[Value], window_end: DateTime<Local>) -> Vec<CanonicalSlot> {
    let fields: Vec<Map<String, Value>> = records.iter().map(slot_fields).collect();
    let starts: Vec<Option<DateTime<Local>>> = fields
        .iter()
        .map(|slot| first_value(slot, &START_KEYS).and_then(coerce_datetime))
        .collect();

    fields
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            let start = starts[index];
            let mut end = first_value(&slot, &END_KEYS).and_then(coerce_datetime);
            if end.is_none() && start.is_some() {
                end = Some(
                    starts[index + 1..]
                        .iter()
                        .flatten()
                        .next()
                        .map_or(window_end, |next_start| *next_start - TimeDelta::seconds(1)),
                );
            }
            CanonicalSlot::new(slot, start, end)
        })
        .collect()
}

/// A non-object record is a bare price: wrap it as `{"value": record}`.
fn slot_fields(record: &Value) -> Map<String, Value> {
    match record {
        Value::Object(fields) => fields.clone(),
        other => Map::from_iter([("value".to_owned(), other.clone())]),
    }
}

fn first_value<'a>(slot: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| slot.get(*key).filter(|value| !value.is_null()))
}

/// Decode a timestamp shipped as a numeric epoch (seconds, or milliseconds
/// above the cutoff) or an ISO-8601 string.
fn coerce_datetime(value: &Value) -> Option<DateTime<Local>> {
    match value {
        Value::Number(number) => {
            let mut epoch = number.as_f64()?;
            if epoch > EPOCH_MILLIS_CUTOFF {
                epoch /= 1000.0;
            }
            let coerced = DateTime::from_timestamp_millis((epoch * 1000.0).round() as i64)?;
            Some(coerced.with_timezone(&Local))
        }
        Value::String(string) => parse_datetime(string),
        _ => None,
    }
}

/// Bare timestamps without an offset are taken as UTC.
fn parse_datetime(value: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Local));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc().with_timezone(&Local))
}
