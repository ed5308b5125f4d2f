//! Image-position occupancy histogram.
//!
//! Tracks where accepted objects have landed in the frame across scenes and
//! proposes new image locations weighted toward the emptier bins, so that a
//! batch of generated stimuli covers the frame evenly.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use stimscape_core::{Point2D, StimError, StimResult};

/// Square grid of counts over the frame, in percent coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyHistogram {
    bins: usize,
    counts: Vec<u64>,
}

impl OccupancyHistogram {
    pub fn new(bins: usize) -> StimResult<Self> {
        if bins == 0 {
            return Err(StimError::config("histogram needs at least one bin"));
        }
        Ok(Self {
            bins,
            counts: vec![0; bins * bins],
        })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Count in the bin containing `percent`, if it lies in the frame.
    pub fn count_at(&self, percent: &Point2D) -> Option<u64> {
        self.index(percent).map(|i| self.counts[i])
    }

    fn index(&self, percent: &Point2D) -> Option<usize> {
        if !(0.0..=100.0).contains(&percent.x) || !(0.0..=100.0).contains(&percent.y) {
            return None;
        }
        let width = 100.0 / self.bins as f64;
        let col = ((percent.x / width) as usize).min(self.bins - 1);
        let row = ((percent.y / width) as usize).min(self.bins - 1);
        Some(row * self.bins + col)
    }

    /// Record an accepted placement. Points outside the frame are ignored.
    pub fn record(&mut self, percent: &Point2D) {
        if let Some(i) = self.index(percent) {
            self.counts[i] += 1;
        }
    }

    /// Propose an image location, in percent of frame. Bin weights are
    /// `max_count - count + 1`, so an empty histogram is uniform and the
    /// fullest bins are never excluded outright.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point2D {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        let weights = self.counts.iter().map(|c| max - c + 1);
        let width = 100.0 / self.bins as f64;
        // Weights are all >= 1, so the index is always constructible.
        let bin = match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..self.counts.len()),
        };
        let (row, col) = (bin / self.bins, bin % self.bins);
        Point2D::new(
            (col as f64 + rng.gen::<f64>()) * width,
            (row as f64 + rng.gen::<f64>()) * width,
        )
    }

    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}
