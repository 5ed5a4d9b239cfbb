//! Client-side data core for the Rust road-defect monitoring platform.
//!
//! The modules mirror the dashboard data pipeline while keeping the network,
//! geolocation, and durable-storage layers behind injectable trait seams so
//! the background service can run against stubs in tests.

pub mod analytics;
pub mod api_model;
pub mod prelude;
pub mod service;
pub mod severity;
pub mod telemetry;
pub mod validation;

pub use service::DashboardService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use api_model::{KpiSnapshot, PotholeLocation};

/// Timing knobs for the background data service.
///
/// KPI aggregates and GPS pushes run on independent cadences because they
/// have different staleness tolerances and backend cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub kpi_interval: Duration,
    pub gps_interval: Duration,
    /// Chance that a GPS push also refreshes the pothole location list,
    /// amortizing the extra read instead of issuing it every cycle.
    pub location_refresh_chance: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            kpi_interval: Duration::from_secs(10),
            gps_interval: Duration::from_secs(5),
            location_refresh_chance: 0.2,
        }
    }
}

/// A single position report from whatever geolocation source is wired in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub lat: f64,
    pub lng: f64,
    /// True when the source fell back to a configured default coordinate
    /// because no live GPS data was available.
    pub fallback: bool,
}

/// Event kinds fanned out to subscribers on each successful update.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Kpis(KpiSnapshot),
    Potholes(Vec<PotholeLocation>),
    Location(GeoFix),
}

/// Last-known values kept by the service, readable at any time so a newly
/// attached view can paint from stale-but-present data before the next poll.
#[derive(Debug, Clone, Default)]
pub struct DashboardCache {
    pub kpis: Option<KpiSnapshot>,
    pub pothole_locations: Vec<PotholeLocation>,
    pub last_update: Option<SystemTime>,
}

/// Common error type for backend fetches issued by the service.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("authentication expired")]
    AuthExpired,
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

/// Error type for geolocation sources.
#[derive(thiserror::Error, Debug)]
pub enum GeoError {
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

/// Backend telemetry surface the background service polls against.
#[async_trait]
pub trait TelemetryFeed: Send + Sync {
    async fn fetch_kpis(&self, session_id: &str) -> FeedResult<KpiSnapshot>;
    async fn fetch_locations(&self, session_id: &str) -> FeedResult<Vec<PotholeLocation>>;
    /// One-directional, best-effort push of the client position.
    async fn push_position(&self, session_id: &str, lat: f64, lng: f64) -> FeedResult<()>;
}

/// Source of the client's current position.
#[async_trait]
pub trait GeoSource: Send + Sync {
    async fn current_position(&self) -> Result<GeoFix, GeoError>;
}

/// Durable key/value store for session markers and credentials.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
