use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Pricing category for which the remote API serves an independent slot series.
#[derive(
    Debug, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum, enumset::EnumSetType,
)]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    Electricity,
    Grid,
    Dso,
    Integrated,
    FeedIn,
}

impl TariffType {
    /// The API's `tariff_type` parameter value, and the key under which a slot
    /// itemizes its per-component prices.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Grid => "grid",
            Self::Dso => "dso",
            Self::Integrated => "integrated",
            Self::FeedIn => "feed_in",
        }
    }
}

impl Display for TariffType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
