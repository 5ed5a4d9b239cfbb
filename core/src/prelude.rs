pub use crate::service::{keys, DashboardService, MemoryStore, SubscriberHandle};
pub use crate::{
    DashboardCache, DashboardEvent, FeedError, FeedResult, GeoError, GeoFix, GeoSource,
    ServiceConfig, SessionStore, TelemetryFeed,
};
