//! Scalar constraint distributions.
//!
//! A [`Distribution4`] describes a scalar by up to four parameters. With no
//! mean it is uniform over `[min, max]`; with a mean it is normal and the
//! draw is clipped (not resampled) to whichever bounds are present, which
//! piles probability mass onto the bounds when they cut into the tails.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{StimError, StimResult};

/// `(mean, std, min, max)`, each optional.
///
/// Invariant (checked at construction): a mean, or both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDistribution", into = "RawDistribution")]
pub struct Distribution4 {
    mean: Option<f64>,
    std: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

/// Unvalidated wire form of [`Distribution4`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct RawDistribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

impl TryFrom<RawDistribution> for Distribution4 {
    type Error = StimError;

    fn try_from(raw: RawDistribution) -> StimResult<Self> {
        Distribution4::new(raw.mean, raw.std, raw.min, raw.max)
    }
}

impl From<Distribution4> for RawDistribution {
    fn from(d: Distribution4) -> Self {
        RawDistribution {
            mean: d.mean,
            std: d.std,
            min: d.min,
            max: d.max,
        }
    }
}

impl Distribution4 {
    pub fn new(
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> StimResult<Self> {
        for (name, v) in [("mean", mean), ("std", std), ("min", min), ("max", max)] {
            if let Some(v) = v.filter(|v| !v.is_finite()) {
                return Err(StimError::config(format!(
                    "distribution {name} must be finite, got {v}"
                )));
            }
        }
        if mean.is_none() && (min.is_none() || max.is_none()) {
            return Err(StimError::config(
                "distribution needs a mean or both min and max",
            ));
        }
        if let Some(s) = std {
            if s < 0.0 {
                return Err(StimError::config(format!(
                    "distribution std must be non-negative, got {s}"
                )));
            }
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(StimError::config(format!(
                    "distribution min ({lo}) exceeds max ({hi})"
                )));
            }
            if !(hi - lo).is_finite() {
                return Err(StimError::config(format!(
                    "distribution range [{lo}, {hi}] is too wide"
                )));
            }
        }
        Ok(Self {
            mean,
            std,
            min,
            max,
        })
    }

    /// A point mass.
    pub fn fixed(value: f64) -> StimResult<Self> {
        Self::new(Some(value), None, None, None)
    }

    /// Uniform over `[min, max]`.
    pub fn uniform(min: f64, max: f64) -> StimResult<Self> {
        Self::new(None, None, Some(min), Some(max))
    }

    /// Unbounded normal.
    pub fn normal(mean: f64, std: f64) -> StimResult<Self> {
        Self::new(Some(mean), Some(std), None, None)
    }

    /// Normal clipped to `[min, max]`.
    pub fn clipped_normal(mean: f64, std: f64, min: f64, max: f64) -> StimResult<Self> {
        Self::new(Some(mean), Some(std), Some(min), Some(max))
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    pub fn std(&self) -> Option<f64> {
        self.std
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Support of the distribution; missing bounds are infinite.
    pub fn bounds(&self) -> (f64, f64) {
        (
            self.min.unwrap_or(f64::NEG_INFINITY),
            self.max.unwrap_or(f64::INFINITY),
        )
    }

    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.bounds();
        value >= lo && value <= hi
    }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.mean {
            None => {
                // Both bounds are present by construction.
                let (lo, hi) = self.bounds();
                if lo == hi {
                    lo
                } else {
                    rng.gen_range(lo..=hi)
                }
            }
            Some(mean) => {
                let z: f64 = match self.std {
                    Some(s) if s > 0.0 => rng.sample::<f64, _>(StandardNormal) * s,
                    _ => 0.0,
                };
                self.clip(mean + z)
            }
        }
    }

    fn clip(&self, value: f64) -> f64 {
        let (lo, hi) = self.bounds();
        value.max(lo).min(hi)
    }

    /// Narrow both bounds inward by `margin`. Absent bounds stay absent; a
    /// mean outside the narrowed range is left as is and clipped on draw.
    pub fn shrink(&self, margin: f64) -> StimResult<Self> {
        let min = self.min.map(|v| v + margin);
        let max = self.max.map(|v| v - margin);
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(StimError::config(format!(
                    "range [{:?}, {:?}] cannot hold an extent of {}",
                    self.min,
                    self.max,
                    2.0 * margin
                )));
            }
        }
        Self::new(self.mean, self.std, min, max)
    }
}
