use chrono::Local;
use clap::Parser;

use crate::{
    api::provider::TariffProvider,
    cli::EsitArgs,
    core::tariff::TariffType,
    ops,
    prelude::*,
};

#[derive(Parser)]
pub struct RawArgs {
    #[clap(flatten)]
    pub esit: EsitArgs,

    /// Tariff type to inspect.
    #[clap(long, env = "TARIFF_TYPE", default_value = "electricity")]
    pub tariff_type: TariffType,

    /// Override the queried year, for tariff simulations.
    #[clap(long, env = "QUERY_YEAR")]
    pub query_year: Option<i32>,
}

impl RawArgs {
    pub async fn run(self) -> Result {
        let api = self.esit.connect()?;
        let now = ops::effective_now(Local::now(), self.query_year);
        let range = ops::fetch_range(now).context("cannot establish the query range")?;

        let response = api.fetch_tariffs(self.tariff_type, range).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }
}
