//! [Swisspower ESIT](https://esit.code-fabrik.ch) tariff API client.

use chrono::{DateTime, Local};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    api::client,
    core::tariff::TariffType,
    prelude::*,
    quantity::time_range::TimeRange,
};

/// Keys under which responses have carried the slot list, by priority.
const SLOT_LIST_KEYS: [&str; 3] = ["prices", "data", "slots"];

/// How the caller is entitled to the tariffs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum AccessMethod {
    /// Query a concrete metering point («Messpunktnummer»), bearer-token
    /// authorized.
    MeteringCode,

    /// Query a published tariff by name.
    TariffName,
}

impl AccessMethod {
    const fn endpoint(self) -> &'static str {
        match self {
            Self::MeteringCode => "metering_code",
            Self::TariffName => "tariff_name",
        }
    }
}

pub struct Esit {
    client: Client,
    base_url: Url,
    method: AccessMethod,
    metering_code: Option<String>,
    token: Option<String>,
    tariff_name: Option<String>,
}

impl Esit {
    pub fn try_new(
        base_url: Url,
        method: AccessMethod,
        metering_code: Option<String>,
        token: Option<String>,
        tariff_name: Option<String>,
    ) -> Result<Self> {
        match method {
            AccessMethod::MeteringCode => {
                ensure!(metering_code.is_some(), "the metering code is required");
            }
            AccessMethod::TariffName => {
                ensure!(tariff_name.is_some(), "the tariff name is required");
            }
        }
        Ok(Self { client: client::try_new()?, base_url, method, metering_code, token, tariff_name })
    }

    pub(crate) async fn call(
        &self,
        tariff_type: TariffType,
        range: TimeRange,
    ) -> Result<TariffResponse> {
        let url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.method.endpoint(),
        );
        let query = TariffQuery::builder()
            .tariff_type(tariff_type)
            .start(range.start)
            .end(range.end)
            .maybe_metering_code(match self.method {
                AccessMethod::MeteringCode => self.metering_code.as_deref(),
                AccessMethod::TariffName => None,
            })
            .maybe_tariff_name(match self.method {
                AccessMethod::MeteringCode => None,
                AccessMethod::TariffName => self.tariff_name.as_deref(),
            })
            .build();
        let mut request = self.client.get(&url).query(&query);
        if self.method == AccessMethod::MeteringCode
            && let Some(token) = &self.token
        {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .with_context(|| format!("failed to call `{url}`"))?
            .error_for_status()
            .with_context(|| format!("`{url}` failed"))?
            .json()
            .await
            .context("failed to deserialize the tariff response")
    }
}

/// Query parameters of one tariff fetch; the timestamps go out as local-time
/// ISO-8601.
#[derive(Serialize, bon::Builder)]
struct TariffQuery<'a> {
    tariff_type: TariffType,

    #[serde(rename = "start_timestamp")]
    start: DateTime<Local>,

    #[serde(rename = "end_timestamp")]
    end: DateTime<Local>,

    #[serde(skip_serializing_if = "Option::is_none")]
    metering_code: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tariff_name: Option<&'a str>,
}

/// Raw decoded response: the `status`/`message` envelope plus whatever else
/// this particular API revision shipped.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TariffResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TariffResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// The slot list, wherever this response shape put it.
    #[must_use]
    pub fn slot_records(&self) -> Option<&Vec<Value>> {
        SLOT_LIST_KEYS.iter().find_map(|key| self.fields.get(*key)?.as_array())
    }
}
