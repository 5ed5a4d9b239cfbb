use serde::{Deserialize, Serialize};

/// Aggregate KPIs computed by the backend for an active session.
///
/// Replaced wholesale on each successful poll; the service never merges
/// partial snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiSnapshot {
    pub total_pothole: u64,
    pub distance_km: f64,
    pub distance_meters: f64,
    pub severity: f64,
    pub severity_level: String,
}

/// A single defect position reported by the detection backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotholeLocation {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: f32,
    pub frame_number: u64,
}

/// Envelope returned by `GET /get_pothole_locations/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationsResponse {
    pub locations: Vec<PotholeLocation>,
}

/// Envelope returned by `GET /pothole_details/{session_id}`, carrying the
/// full marker set plus summary statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PotholeDetails {
    pub potholes: Vec<PotholeLocation>,
    pub total_count: u64,
    pub average_confidence: f32,
}
