mod overview;
mod raw;
mod slots;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use enumset::EnumSet;
use reqwest::Url;

pub use self::{overview::OverviewArgs, raw::RawArgs, slots::SlotsArgs};
use crate::{
    api::esit::{AccessMethod, Esit},
    cache::Cache,
    core::tariff::TariffType,
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the tariffs and show the full statistics overview.
    Overview(Box<OverviewArgs>),

    /// Fetch one tariff type and list its normalized price slots.
    Slots(Box<SlotsArgs>),

    /// Fetch one tariff type and dump the raw response as JSON.
    Raw(Box<RawArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Overview(args) => args.run().await,
            Self::Slots(args) => args.run().await,
            Self::Raw(args) => args.run().await,
        }
    }
}

#[derive(Parser)]
pub struct EsitArgs {
    /// ESIT API base URL.
    #[clap(
        long = "api-base-url",
        env = "ESIT_API_BASE_URL",
        default_value = "https://esit.code-fabrik.ch/api/v1"
    )]
    pub base_url: Url,

    /// Whether to query a concrete metering point or a published tariff name.
    #[clap(long, env = "ESIT_ACCESS_METHOD", value_enum, default_value = "metering-code")]
    pub method: AccessMethod,

    /// Metering point identifier («Messpunktnummer»).
    #[clap(long, env = "ESIT_METERING_CODE")]
    pub metering_code: Option<String>,

    /// Bearer token for the metering-code endpoint.
    #[clap(long, env = "ESIT_TOKEN")]
    pub token: Option<String>,

    /// Published tariff name.
    #[clap(long, env = "ESIT_TARIFF_NAME")]
    pub tariff_name: Option<String>,
}

impl EsitArgs {
    pub fn connect(&self) -> Result<Esit> {
        Esit::try_new(
            self.base_url.clone(),
            self.method,
            self.metering_code.clone(),
            self.token.clone(),
            self.tariff_name.clone(),
        )
    }
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Tariff types to query.
    #[clap(
        long = "tariff-types",
        env = "TARIFF_TYPES",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "electricity"
    )]
    pub tariff_types: Vec<TariffType>,

    /// Price component to single out, for example `work` or `grid-fee`.
    #[clap(long, env = "PRICE_COMPONENT")]
    pub component: Option<String>,

    /// Override the queried year, for tariff simulations.
    #[clap(long, env = "QUERY_YEAR")]
    pub query_year: Option<i32>,

    /// Last-known responses, reused when a refresh fails.
    #[clap(long, env = "CACHE_PATH")]
    pub cache_path: Option<PathBuf>,
}

impl QueryArgs {
    #[must_use]
    pub fn tariff_types(&self) -> EnumSet<TariffType> {
        self.tariff_types.iter().copied().collect()
    }

    #[must_use]
    pub fn read_cache(&self) -> Cache {
        self.cache_path.as_deref().map_or_else(Cache::default, Cache::read_from)
    }

    pub fn write_cache(&self, cache: &Cache) {
        if let Some(path) = self.cache_path.as_deref() {
            cache.write_to(path);
        }
    }
}
