use async_trait::async_trait;

use crate::{
    api::esit::{Esit, TariffResponse},
    core::tariff::TariffType,
    prelude::*,
    quantity::time_range::TimeRange,
};

/// The fetch seam: one call per tariff type and query range, returning the
/// raw decoded response. The statistics core never touches the network;
/// everything behind this trait is replaceable in tests.
#[async_trait]
pub trait TariffProvider: Sync {
    async fn fetch_tariffs(
        &self,
        tariff_type: TariffType,
        range: TimeRange,
    ) -> Result<TariffResponse>;
}

#[async_trait]
impl TariffProvider for Esit {
    #[instrument(skip_all, fields(tariff_type = %tariff_type, range = ?range))]
    async fn fetch_tariffs(
        &self,
        tariff_type: TariffType,
        range: TimeRange,
    ) -> Result<TariffResponse> {
        info!("fetching…");
        let response = self.call(tariff_type, range).await?;
        info!(n_records = response.slot_records().map_or(0, Vec::len), "fetched");
        Ok(response)
    }
}
