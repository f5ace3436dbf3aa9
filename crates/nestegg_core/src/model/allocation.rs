//! Portfolio allocations and weight bounds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Asset identifier -> portfolio weight
///
/// Keys are kept sorted so iteration (and serialized output) is deterministic.
/// Weights of caller-supplied allocations need not sum to one; optimizer
/// output always does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation(BTreeMap<String, f64>);

impl Allocation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, asset: impl Into<String>, weight: f64) -> Self {
        self.0.insert(asset.into(), weight);
        self
    }

    pub fn insert(&mut self, asset: impl Into<String>, weight: f64) -> Option<f64> {
        self.0.insert(asset.into(), weight)
    }

    #[must_use]
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.0.get(asset).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all weights
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Copy scaled so the weights sum to one; unchanged when the total is not positive
    #[must_use]
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if !(total > 0.0 && total.is_finite()) {
            return self.clone();
        }
        Self(self.0.iter().map(|(k, v)| (k.clone(), v / total)).collect())
    }

    /// True when every weight is finite and within `bounds`
    #[must_use]
    pub fn is_within(&self, bounds: WeightBounds) -> bool {
        self.0.values().all(|w| w.is_finite() && bounds.contains(*w))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Allocation {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Inclusive lower/upper bound on a single asset weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub low: f64,
    pub high: f64,
}

impl WeightBounds {
    /// Slack allowed when checking optimizer output against bounds
    pub const TOLERANCE: f64 = 1e-9;

    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Long-only, no leverage
    #[must_use]
    pub const fn long_only() -> Self {
        Self::new(0.0, 1.0)
    }

    #[must_use]
    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.low - Self::TOLERANCE && weight <= self.high + Self::TOLERANCE
    }

    #[must_use]
    pub fn clamp(&self, weight: f64) -> f64 {
        weight.clamp(self.low, self.high)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self::long_only()
    }
}
