use serde::{Deserialize, Serialize};

/// Response from `POST /start_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
}

/// Response from `GET /processing_status/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingStatus {
    pub processing_complete: bool,
    pub video_ready: bool,
}

/// One row of a user's session history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: String,
    pub status: String,
    pub total_potholes: u64,
    pub distance_km: f64,
}

/// Full record returned by `GET /session/details/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDetails {
    pub session_id: String,
    pub user_email: String,
    pub category: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub status: String,
    pub total_potholes: u64,
    pub distance_km: f64,
    pub severity: f64,
    pub severity_level: String,
}

/// A recorded client position from `GET /session/gps_track/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsTrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsTrack {
    pub points: Vec<GpsTrackPoint>,
}

/// Availability record from `GET /video_info/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub available: bool,
    pub size_bytes: u64,
    pub filename: Option<String>,
}
