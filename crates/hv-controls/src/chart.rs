//! Bounded chart history of `(timestamp, temperature, humidity)` points.

use serde::{Deserialize, Serialize};

/// One sampled point as shown on the front-end chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Unix timestamp in seconds.
    pub time: f64,
    pub temp: f64,
    pub humid: f64,
}

/// Append-only series that halves itself once it grows past a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    points: Vec<ChartPoint>,
    prune_threshold: usize,
}

impl ChartSeries {
    pub fn new(prune_threshold: usize) -> Self {
        Self {
            points: Vec::new(),
            prune_threshold: prune_threshold.max(2),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn push(&mut self, point: ChartPoint) {
        self.points.push(point);
    }

    /// Thin the series once it exceeds the threshold.
    ///
    /// Keeps every second point (odd indices), then drops the oldest
    /// survivor. Relative order is preserved. Returns `true` if pruned.
    pub fn prune(&mut self) -> bool {
        if self.points.len() <= self.prune_threshold {
            return false;
        }
        let mut kept: Vec<ChartPoint> = self.points.iter().skip(1).step_by(2).copied().collect();
        if !kept.is_empty() {
            kept.remove(0);
        }
        self.points = kept;
        true
    }

    /// Points at or after `since` (all points when `None`).
    pub fn since(&self, since: Option<f64>) -> Vec<ChartPoint> {
        match since {
            Some(t) => self.points.iter().filter(|p| p.time >= t).copied().collect(),
            None => self.points.clone(),
        }
    }
}
