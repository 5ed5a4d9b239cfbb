pub mod admin;
pub mod auth;
pub mod detection;
pub mod session;

pub use admin::{ThresholdMap, ThresholdRow};
pub use auth::{LoginResponse, MessageResponse, SignupRequest, UserProfile};
pub use detection::{KpiSnapshot, LocationsResponse, PotholeDetails, PotholeLocation};
pub use session::{
    GpsTrack, GpsTrackPoint, ProcessingStatus, SessionDetails, SessionSummary,
    StartSessionResponse, VideoInfo,
};
