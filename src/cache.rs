use std::{collections::BTreeMap, fs, path::Path};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{api::esit::TariffResponse, core::tariff::TariffType, prelude::*};

/// Last successful raw responses, one per tariff type.
///
/// When a refresh fails, the cached response stands in as the last-known
/// state, so one broken tariff type does not black out the others.
#[derive(Default, Serialize, Deserialize)]
pub struct Cache {
    pub fetched_at: Option<DateTime<Local>>,

    #[serde(default)]
    pub responses: BTreeMap<TariffType, TariffResponse>,
}

impl Cache {
    /// Read the cache, degrading to an empty one on any error.
    #[instrument(fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Self {
        Self::read_fallibly_from(path).unwrap_or_else(|error| {
            warn!(error = format!("{error:#}"), "failed to read the cache");
            Self::default()
        })
    }

    fn read_fallibly_from(path: &Path) -> Result<Self> {
        if path.is_file() { Ok(serde_json::from_slice(&fs::read(path)?)?) } else { Ok(Self::default()) }
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) {
        if let Err(error) = self.write_fallibly_to(path) {
            warn!(error = format!("{error:#}"), "failed to write the cache");
        }
    }

    fn write_fallibly_to(&self, path: &Path) -> Result {
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
