use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One density band of the per-region pothole threshold table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdRow {
    pub min: f64,
    pub max: f64,
    pub status: String,
    pub action: String,
}

/// Threshold bands keyed by region, as served by `GET /api/thresholds/`.
pub type ThresholdMap = BTreeMap<String, Vec<ThresholdRow>>;
