use chrono::{DateTime, Datelike, Days, Local, TimeDelta};
use enumset::EnumSet;

use crate::{
    api::provider::TariffProvider,
    cache::Cache,
    core::{snapshot::TariffSnapshot, tariff::TariffType},
    prelude::*,
    quantity::time_range::TimeRange,
};

/// `now` with the optional year override applied, for tariff simulations.
///
/// February 29 clamps to day 28 when the target year lacks it.
#[must_use]
pub fn effective_now(now: DateTime<Local>, query_year: Option<i32>) -> DateTime<Local> {
    let Some(year) = query_year else { return now };
    now.with_year(year)
        .or_else(|| now.with_day(28)?.with_year(year))
        .unwrap_or(now)
}

/// Two local days starting at the effective day's midnight.
///
/// The API is queried inclusively, so the range end backs off one second; it
/// doubles as the normalizer's fallback for the last open-ended slot.
#[must_use]
pub fn fetch_range(now: DateTime<Local>) -> Option<TimeRange> {
    let today = TimeRange::local_day(now, 0)?;
    let end = today.start.checked_add_days(Days::new(2))? - TimeDelta::seconds(1);
    Some(TimeRange::new(today.start, end))
}

/// One refresh cycle: fetch every configured tariff type and normalize each
/// response into an immutable snapshot.
///
/// A transport error or a non-`ok` status degrades that tariff type to its
/// cached last-known response, or skips it with a warning, so one broken
/// tariff type never hides the others. Only a refresh with no usable tariff
/// at all is an error.
#[instrument(skip_all, fields(n_tariff_types = tariff_types.len()))]
pub async fn fetch_snapshots<P: TariffProvider>(
    provider: &P,
    tariff_types: EnumSet<TariffType>,
    now: DateTime<Local>,
    cache: &mut Cache,
) -> Result<Vec<TariffSnapshot>> {
    let range = fetch_range(now).context("cannot establish the query range")?;
    let mut snapshots = Vec::new();
    for tariff_type in tariff_types {
        let response = match provider.fetch_tariffs(tariff_type, range).await {
            Ok(response) if response.is_ok() => {
                cache.fetched_at = Some(now);
                cache.responses.insert(tariff_type, response.clone());
                Some(response)
            }
            Ok(response) => {
                warn!(
                    %tariff_type,
                    reason = response.message.as_deref().unwrap_or("unknown API error"),
                    "update failed, falling back to the last-known state",
                );
                cache.responses.get(&tariff_type).cloned()
            }
            Err(error) => {
                warn!(
                    %tariff_type,
                    error = format!("{error:#}"),
                    "update failed, falling back to the last-known state",
                );
                cache.responses.get(&tariff_type).cloned()
            }
        };
        let Some(response) = response else {
            warn!(%tariff_type, "no data, skipping");
            continue;
        };
        let records = response.slot_records().cloned().unwrap_or_default();
        snapshots.push(TariffSnapshot::from_records(tariff_type, &records, range.end));
    }
    ensure!(!snapshots.is_empty(), "no tariff data is available");
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::api::esit::TariffResponse;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, hour, minute, 0).unwrap()
    }

    /// Serves electricity, errors on grid, panics on the rest.
    struct FakeProvider;

    #[async_trait]
    impl TariffProvider for FakeProvider {
        async fn fetch_tariffs(
            &self,
            tariff_type: TariffType,
            range: TimeRange,
        ) -> Result<TariffResponse> {
            match tariff_type {
                TariffType::Electricity => Ok(serde_json::from_value(json!({
                    "status": "ok",
                    "prices": [{"start_timestamp": range.start.to_rfc3339(), "value": 0.25}],
                }))?),
                TariffType::Grid => Ok(serde_json::from_value(
                    json!({"status": "error", "message": "no access"}),
                )?),
                _ => bail!("unexpected tariff type"),
            }
        }
    }

    #[test]
    fn test_effective_now_without_override() {
        let now = at(10, 30);
        assert_eq!(effective_now(now, None), now);
    }

    #[test]
    fn test_effective_now_replaces_the_year() {
        let now = at(10, 30);
        assert_eq!(
            effective_now(now, Some(2023)),
            Local.with_ymd_and_hms(2023, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_effective_now_clamps_leap_day() {
        let now = Local.with_ymd_and_hms(2024, 2, 29, 10, 30, 0).unwrap();
        assert_eq!(
            effective_now(now, Some(2023)),
            Local.with_ymd_and_hms(2023, 2, 28, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_fetch_range_spans_two_days_inclusively() {
        let range = fetch_range(at(10, 30)).unwrap();
        assert_eq!(range.start, Local.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(range.end, Local.with_ymd_and_hms(2024, 1, 16, 23, 59, 59).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_snapshots_degrades_per_tariff_type() -> Result {
        let now = at(10, 30);
        let mut cache = Cache::default();
        let snapshots = fetch_snapshots(
            &FakeProvider,
            TariffType::Electricity | TariffType::Grid,
            now,
            &mut cache,
        )
        .await?;

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].tariff_type(), TariffType::Electricity);
        assert_eq!(snapshots[0].current_price(now, None), Some(0.25.into()));
        assert!(cache.responses.contains_key(&TariffType::Electricity));
        assert!(!cache.responses.contains_key(&TariffType::Grid));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_snapshots_falls_back_to_cached_response() -> Result {
        let now = at(10, 30);
        let mut cache = Cache::default();
        cache.responses.insert(
            TariffType::Grid,
            serde_json::from_value(json!({
                "status": "ok",
                "prices": [{"start_timestamp": now.to_rfc3339(), "value": 0.05}],
            }))?,
        );

        let snapshots =
            fetch_snapshots(&FakeProvider, EnumSet::only(TariffType::Grid), now, &mut cache)
                .await?;
        assert_eq!(snapshots[0].current_price(now, None), Some(0.05.into()));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_snapshots_requires_any_usable_tariff() {
        let mut cache = Cache::default();
        let result =
            fetch_snapshots(&FakeProvider, EnumSet::only(TariffType::Grid), at(10, 30), &mut cache)
                .await;
        assert!(result.is_err());
    }
}
