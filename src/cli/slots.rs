use chrono::Local;
use clap::Parser;

use crate::{
    api::provider::TariffProvider,
    cli::EsitArgs,
    core::{snapshot::TariffSnapshot, tariff::TariffType},
    ops,
    prelude::*,
    tables,
};

#[derive(Parser)]
pub struct SlotsArgs {
    #[clap(flatten)]
    pub esit: EsitArgs,

    /// Tariff type to inspect.
    #[clap(long, env = "TARIFF_TYPE", default_value = "electricity")]
    pub tariff_type: TariffType,

    /// Price component to single out.
    #[clap(long, env = "PRICE_COMPONENT")]
    pub component: Option<String>,

    /// Override the queried year, for tariff simulations.
    #[clap(long, env = "QUERY_YEAR")]
    pub query_year: Option<i32>,
}

impl SlotsArgs {
    pub async fn run(self) -> Result {
        let api = self.esit.connect()?;
        let now = ops::effective_now(Local::now(), self.query_year);
        let range = ops::fetch_range(now).context("cannot establish the query range")?;

        let response = api.fetch_tariffs(self.tariff_type, range).await?;
        ensure!(
            response.is_ok(),
            "update failed: {}",
            response.message.as_deref().unwrap_or("unknown API error"),
        );

        let records = response.slot_records().cloned().unwrap_or_default();
        let snapshot = TariffSnapshot::from_records(self.tariff_type, &records, range.end);
        println!("{}", tables::build_slots_table(&snapshot, self.component.as_deref()));
        Ok(())
    }
}
