//! Lenient handling of JSON numbers coming from the backend.
//!
//! Backends built on decimal or float serializers send `1500.0` where others
//! send `1500`.  Both must be accepted, and an integral value must render
//! without a trailing `.0`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// A score exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(Number);

impl Score {
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }
}

impl From<i64> for Score {
    fn from(v: i64) -> Self {
        Self(Number::from(v))
    }
}

impl PartialEq<i64> for Score {
    fn eq(&self, other: &i64) -> bool {
        self.as_f64() == *other as f64
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_i64() || self.0.is_u64() {
            return write!(f, "{}", self.0);
        }
        let v = self.as_f64();
        // Integral floats below 2^53 are exact.
        if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
            write!(f, "{}", v as i64)
        } else {
            write!(f, "{v}")
        }
    }
}

/// Deserializes an optional millisecond count from any JSON number.
///
/// Fractions are rounded; negative values count as absent.
pub(crate) fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u64))
}
