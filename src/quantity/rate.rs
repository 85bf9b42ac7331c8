use std::{
    fmt::{Debug, Display, Formatter},
    ops::Div,
};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Swiss francs per kilowatt-hour.
///
/// Wraps [`OrderedFloat`] so that extremes and percentile sorting get a total
/// order without partial-comparison fallbacks.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::Sum,
)]
pub struct KilowattHourRate(pub OrderedFloat<f64>);

impl KilowattHourRate {
    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.0.0
    }
}

impl From<f64> for KilowattHourRate {
    fn from(value: f64) -> Self {
        Self(OrderedFloat(value))
    }
}

impl Div<f64> for KilowattHourRate {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(OrderedFloat(self.0.0 / rhs))
    }
}

impl Display for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} CHF/kWh", self.0)
    }
}

impl Debug for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}CHF/kWh", self.0)
    }
}
