use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::SystemTime;

use log::{debug, error, info, warn};
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::api_model::{KpiSnapshot, PotholeLocation};
use crate::service::keys;
use crate::telemetry::{PollMetrics, PollStats};
use crate::{
    DashboardCache, DashboardEvent, GeoSource, ServiceConfig, SessionStore, TelemetryFeed,
};

pub type SubscriberFn = dyn Fn(&DashboardEvent, &DashboardCache) + Send + Sync;

type SubscriberRegistry = Mutex<Vec<(u64, Box<SubscriberFn>)>>;

/// Registration handle returned by [`DashboardService::subscribe`].
/// Invoking [`unsubscribe`](SubscriberHandle::unsubscribe) removes exactly
/// this registration; other subscribers are unaffected.
pub struct SubscriberHandle {
    id: u64,
    registry: Weak<SubscriberRegistry>,
}

impl SubscriberHandle {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut subscribers) = registry.lock() {
                subscribers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

struct ActiveSession {
    session_id: String,
    kpi_task: JoinHandle<()>,
    gps_task: JoinHandle<()>,
}

impl ActiveSession {
    fn abort(&self) {
        self.kpi_task.abort();
        self.gps_task.abort();
    }
}

struct ServiceInner<F, G, S> {
    feed: F,
    geo: G,
    store: S,
    config: ServiceConfig,
    cache: RwLock<DashboardCache>,
    subscribers: Arc<SubscriberRegistry>,
    next_subscriber_id: AtomicU64,
    kpi_dispatched: AtomicU64,
    kpi_applied: AtomicU64,
    location_dispatched: AtomicU64,
    location_applied: AtomicU64,
    metrics: PollMetrics,
}

/// Background data service keeping session telemetry fresh independent of
/// which view is attached.
///
/// At most one session is active for polling purposes; starting a new one
/// stops the old timers first, so two polling loops never coexist. Poll
/// failures are logged and counted, never fatal: the next tick retries.
pub struct DashboardService<F, G, S> {
    inner: Arc<ServiceInner<F, G, S>>,
    active: Mutex<Option<ActiveSession>>,
}

impl<F, G, S> DashboardService<F, G, S>
where
    F: TelemetryFeed + 'static,
    G: GeoSource + 'static,
    S: SessionStore + 'static,
{
    pub fn new(feed: F, geo: G, store: S, config: ServiceConfig) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                feed,
                geo,
                store,
                config,
                cache: RwLock::new(DashboardCache::default()),
                subscribers: Arc::new(Mutex::new(Vec::new())),
                next_subscriber_id: AtomicU64::new(1),
                kpi_dispatched: AtomicU64::new(0),
                kpi_applied: AtomicU64::new(0),
                location_dispatched: AtomicU64::new(0),
                location_applied: AtomicU64::new(0),
                metrics: PollMetrics::new(),
            }),
            active: Mutex::new(None),
        }
    }

    /// Starts background polling for `session_id`. A no-op when this exact
    /// session is already being polled; otherwise the previous session's
    /// timers are stopped first. Performs one immediate fetch of both KPI
    /// and location data before the recurring timers take over.
    pub async fn start_session(&self, session_id: &str) {
        {
            let mut active = self.active.lock().unwrap();
            if let Some(current) = active.as_ref() {
                if current.session_id == session_id {
                    debug!(
                        "dashboard service already running for session {}",
                        session_id
                    );
                    return;
                }
            }
            if let Some(previous) = active.take() {
                previous.abort();
            }
            info!("starting dashboard service for session {}", session_id);
            self.inner
                .store
                .set(keys::ACTIVE_DASHBOARD_SESSION, session_id);
            *active = Some(self.spawn_pollers(session_id));
        }

        tokio::join!(
            self.inner.fetch_kpis(session_id),
            self.inner.fetch_locations(session_id)
        );
    }

    /// Cancels both recurring fetches and clears the active session marker.
    /// Idempotent; the cache keeps its last-known values.
    pub fn stop_session(&self) {
        let mut active = self.active.lock().unwrap();
        if let Some(session) = active.take() {
            info!(
                "stopping dashboard service for session {}",
                session.session_id
            );
            session.abort();
        }
        self.inner.store.remove(keys::ACTIVE_DASHBOARD_SESSION);
    }

    /// Registers `callback` for future updates of either data kind. The
    /// cache passed to the callback already contains the event's payload.
    pub fn subscribe<C>(&self, callback: C) -> SubscriberHandle
    where
        C: Fn(&DashboardEvent, &DashboardCache) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.push((id, Box::new(callback)));
        }
        SubscriberHandle {
            id,
            registry: Arc::downgrade(&self.inner.subscribers),
        }
    }

    /// Copy of the last-known values; never touches the network.
    pub fn cached_data(&self) -> DashboardCache {
        self.inner.cache.read().unwrap().clone()
    }

    /// The in-memory active session id, falling back to the durable marker
    /// so a fresh process sees the session a previous run left behind.
    pub fn active_session(&self) -> Option<String> {
        let active = self.active.lock().unwrap();
        active
            .as_ref()
            .map(|session| session.session_id.clone())
            .or_else(|| self.inner.store.get(keys::ACTIVE_DASHBOARD_SESSION))
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    pub fn metrics(&self) -> PollStats {
        self.inner.metrics.snapshot()
    }

    /// Explicit recovery path, never called automatically: resumes polling
    /// only when the persisted dashboard marker matches the live-session
    /// marker. A dashboard marker without a live counterpart is stale (the
    /// user already ended that session) and gets cleared instead.
    pub async fn resume_session_if_exists(&self) {
        let dashboard = self.inner.store.get(keys::ACTIVE_DASHBOARD_SESSION);
        let live = self.inner.store.get(keys::LIVE_SESSION_ID);
        match (dashboard, live) {
            (Some(session_id), Some(live_id)) if session_id == live_id => {
                info!("resuming dashboard service for session {}", session_id);
                self.start_session(&session_id).await;
            }
            (Some(_), None) => {
                info!("clearing stale dashboard session marker");
                self.inner.store.remove(keys::ACTIVE_DASHBOARD_SESSION);
            }
            _ => {}
        }
    }

    fn spawn_pollers(&self, session_id: &str) -> ActiveSession {
        // Tickers are built before spawning so their epoch is the moment the
        // session starts, not whenever the task first gets polled.
        let kpi_inner = Arc::clone(&self.inner);
        let kpi_session = session_id.to_string();
        let kpi_period = self.inner.config.kpi_interval;
        let mut kpi_ticker = time::interval_at(time::Instant::now() + kpi_period, kpi_period);
        kpi_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let kpi_task = tokio::spawn(async move {
            loop {
                kpi_ticker.tick().await;
                debug!("[background] fetching KPIs");
                kpi_inner.fetch_kpis(&kpi_session).await;
            }
        });

        let gps_inner = Arc::clone(&self.inner);
        let gps_session = session_id.to_string();
        let gps_period = self.inner.config.gps_interval;
        let mut gps_ticker = time::interval_at(time::Instant::now() + gps_period, gps_period);
        gps_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let gps_task = tokio::spawn(async move {
            loop {
                gps_ticker.tick().await;
                debug!("[background] updating GPS location");
                gps_inner.push_position_cycle(&gps_session).await;
            }
        });

        ActiveSession {
            session_id: session_id.to_string(),
            kpi_task,
            gps_task,
        }
    }
}

impl<F, G, S> ServiceInner<F, G, S>
where
    F: TelemetryFeed,
    G: GeoSource,
    S: SessionStore,
{
    async fn fetch_kpis(&self, session_id: &str) {
        let seq = self.kpi_dispatched.fetch_add(1, Ordering::SeqCst) + 1;
        match self.feed.fetch_kpis(session_id).await {
            Ok(snapshot) => self.apply_kpis(seq, snapshot),
            Err(err) => {
                self.metrics.record_error();
                error!("[background] KPI fetch failed: {}", err);
            }
        }
    }

    fn apply_kpis(&self, seq: u64, snapshot: KpiSnapshot) {
        if !advance_watermark(&self.kpi_applied, seq) {
            warn!("discarding stale KPI response (seq {})", seq);
            return;
        }
        let cache = {
            let mut guard = self.cache.write().unwrap();
            guard.kpis = Some(snapshot.clone());
            guard.last_update = Some(SystemTime::now());
            guard.clone()
        };
        self.metrics.record_kpi_update();
        self.notify(&DashboardEvent::Kpis(snapshot), &cache);
    }

    async fn fetch_locations(&self, session_id: &str) {
        let seq = self.location_dispatched.fetch_add(1, Ordering::SeqCst) + 1;
        match self.feed.fetch_locations(session_id).await {
            Ok(locations) => self.apply_locations(seq, locations),
            Err(err) => {
                self.metrics.record_error();
                error!("[background] pothole location fetch failed: {}", err);
            }
        }
    }

    fn apply_locations(&self, seq: u64, locations: Vec<PotholeLocation>) {
        if !advance_watermark(&self.location_applied, seq) {
            warn!("discarding stale location response (seq {})", seq);
            return;
        }
        let cache = {
            let mut guard = self.cache.write().unwrap();
            guard.pothole_locations = locations.clone();
            guard.last_update = Some(SystemTime::now());
            guard.clone()
        };
        self.metrics.record_location_update();
        self.notify(&DashboardEvent::Potholes(locations), &cache);
    }

    /// One GPS cycle: read the current position and forward it upstream.
    /// Best-effort and one-directional; a geolocation failure skips the
    /// push rather than failing the loop.
    async fn push_position_cycle(&self, session_id: &str) {
        let fix = match self.geo.current_position().await {
            Ok(fix) => fix,
            Err(err) => {
                self.metrics.record_error();
                warn!("[background] {}", err);
                return;
            }
        };
        if !fix.lat.is_finite() || !fix.lng.is_finite() {
            error!("invalid coordinates: {} / {}", fix.lat, fix.lng);
            return;
        }

        match self.feed.push_position(session_id, fix.lat, fix.lng).await {
            Ok(()) => {
                self.metrics.record_position_push();
                let cache = self.cache.read().unwrap().clone();
                self.notify(&DashboardEvent::Location(fix), &cache);
                if self.should_refresh_locations() {
                    self.fetch_locations(session_id).await;
                }
            }
            Err(err) => {
                self.metrics.record_error();
                error!("[background] location push failed: {}", err);
            }
        }
    }

    fn should_refresh_locations(&self) -> bool {
        let chance = self.config.location_refresh_chance;
        chance > 0.0 && rand::thread_rng().gen::<f64>() < chance
    }

    fn notify(&self, event: &DashboardEvent, cache: &DashboardCache) {
        if let Ok(subscribers) = self.subscribers.lock() {
            for (_, callback) in subscribers.iter() {
                callback(event, cache);
            }
        }
    }
}

/// Advances the applied-sequence watermark, refusing responses that are
/// older than the newest one already applied (a slow poll must not clobber
/// a faster successor).
fn advance_watermark(watermark: &AtomicU64, seq: u64) -> bool {
    let mut applied = watermark.load(Ordering::SeqCst);
    loop {
        if seq < applied {
            return false;
        }
        match watermark.compare_exchange(applied, seq, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return true,
            Err(current) => applied = current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryStore;
    use crate::{FeedResult, GeoError, GeoFix};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    #[derive(Default)]
    struct StubState {
        kpi_sessions: Mutex<Vec<String>>,
        location_sessions: Mutex<Vec<String>>,
        pushes: Mutex<Vec<(String, f64, f64)>>,
        fail_kpis: AtomicBool,
    }

    #[derive(Clone, Default)]
    struct StubFeed {
        state: Arc<StubState>,
    }

    impl StubFeed {
        fn kpi_sessions(&self) -> Vec<String> {
            self.state.kpi_sessions.lock().unwrap().clone()
        }

        fn location_sessions(&self) -> Vec<String> {
            self.state.location_sessions.lock().unwrap().clone()
        }

        fn push_count(&self) -> usize {
            self.state.pushes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TelemetryFeed for StubFeed {
        async fn fetch_kpis(&self, session_id: &str) -> FeedResult<KpiSnapshot> {
            if self.state.fail_kpis.load(Ordering::SeqCst) {
                return Err(crate::FeedError::Transport("stub outage".into()));
            }
            let mut sessions = self.state.kpi_sessions.lock().unwrap();
            sessions.push(session_id.to_string());
            Ok(KpiSnapshot {
                total_pothole: sessions.len() as u64,
                distance_km: 1.25,
                distance_meters: 1250.0,
                severity: 3.2,
                severity_level: "Low".to_string(),
            })
        }

        async fn fetch_locations(&self, session_id: &str) -> FeedResult<Vec<PotholeLocation>> {
            self.state
                .location_sessions
                .lock()
                .unwrap()
                .push(session_id.to_string());
            Ok(vec![PotholeLocation {
                id: 1,
                latitude: 28.61,
                longitude: 77.21,
                confidence: 0.92,
                frame_number: 42,
            }])
        }

        async fn push_position(&self, session_id: &str, lat: f64, lng: f64) -> FeedResult<()> {
            self.state
                .pushes
                .lock()
                .unwrap()
                .push((session_id.to_string(), lat, lng));
            Ok(())
        }
    }

    #[derive(Clone, Copy)]
    struct StaticGeo;

    #[async_trait]
    impl GeoSource for StaticGeo {
        async fn current_position(&self) -> Result<GeoFix, GeoError> {
            Ok(GeoFix {
                lat: 28.6139,
                lng: 77.2090,
                fallback: false,
            })
        }
    }

    #[derive(Clone, Copy)]
    struct BrokenGeo;

    #[async_trait]
    impl GeoSource for BrokenGeo {
        async fn current_position(&self) -> Result<GeoFix, GeoError> {
            Err(GeoError::Unavailable("no receiver".into()))
        }
    }

    fn config(refresh_chance: f64) -> ServiceConfig {
        ServiceConfig {
            kpi_interval: Duration::from_secs(10),
            gps_interval: Duration::from_secs(5),
            location_refresh_chance: refresh_chance,
        }
    }

    fn service(
        feed: StubFeed,
        store: MemoryStore,
        refresh_chance: f64,
    ) -> DashboardService<StubFeed, StaticGeo, MemoryStore> {
        DashboardService::new(feed, StaticGeo, store, config(refresh_chance))
    }

    /// Steps the paused clock one second at a time so every due tick fires
    /// in order and the poll loops get scheduled between steps.
    async fn run_for(secs: u64) {
        for _ in 0..secs {
            time::advance(Duration::from_secs(1)).await;
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent_for_the_active_session() {
        let feed = StubFeed::default();
        let svc = service(feed.clone(), MemoryStore::new(), 0.0);

        svc.start_session("S1").await;
        svc.start_session("S1").await;
        assert_eq!(feed.kpi_sessions(), vec!["S1"]);

        run_for(30).await;
        // One initial fetch plus three 10s ticks; a duplicate timer pair
        // would have doubled this.
        assert_eq!(feed.kpi_sessions().len(), 4);
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_anchored_to_the_session_start() {
        let feed = StubFeed::default();
        let svc = service(feed.clone(), MemoryStore::new(), 0.0);

        svc.start_session("S1").await;
        run_for(9).await;
        // Only the initial fetch so far; the first KPI tick is due at 10s.
        assert_eq!(feed.kpi_sessions().len(), 1);
        run_for(1).await;
        assert_eq!(feed.kpi_sessions().len(), 2);
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn switching_sessions_polls_only_the_new_one() {
        let feed = StubFeed::default();
        let svc = service(feed.clone(), MemoryStore::new(), 0.0);

        svc.start_session("S1").await;
        run_for(10).await;
        svc.start_session("S2").await;
        run_for(20).await;

        assert_eq!(feed.kpi_sessions(), vec!["S1", "S1", "S2", "S2", "S2"]);
        assert_eq!(feed.location_sessions(), vec!["S1", "S2"]);
        assert_eq!(svc.active_session().as_deref(), Some("S2"));
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn cache_survives_stop() {
        let feed = StubFeed::default();
        let svc = service(feed, MemoryStore::new(), 0.0);

        svc.start_session("S1").await;
        assert!(svc.cached_data().kpis.is_some());

        svc.stop_session();
        let cache = svc.cached_data();
        assert!(cache.kpis.is_some());
        assert_eq!(cache.pothole_locations.len(), 1);
        assert!(cache.last_update.is_some());
        assert!(!svc.is_running());
        assert_eq!(svc.active_session(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_removes_exactly_one_registration() {
        let feed = StubFeed::default();
        let svc = service(feed, MemoryStore::new(), 0.0);

        let first_seen = Arc::new(AtomicUsize::new(0));
        let second_seen = Arc::new(AtomicUsize::new(0));
        let first_counter = Arc::clone(&first_seen);
        let second_counter = Arc::clone(&second_seen);

        let first = svc.subscribe(move |_, _| {
            first_counter.fetch_add(1, Ordering::SeqCst);
        });
        let _second = svc.subscribe(move |_, _| {
            second_counter.fetch_add(1, Ordering::SeqCst);
        });

        svc.start_session("S1").await;
        // Initial fetch delivers one KPI and one location-list event.
        assert_eq!(first_seen.load(Ordering::SeqCst), 2);
        assert_eq!(second_seen.load(Ordering::SeqCst), 2);

        first.unsubscribe();
        run_for(10).await;
        // One KPI tick and two GPS pushes for the survivor only.
        assert_eq!(first_seen.load(Ordering::SeqCst), 2);
        assert_eq!(second_seen.load(Ordering::SeqCst), 5);
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_observe_cache_already_updated() {
        let feed = StubFeed::default();
        let svc = service(feed, MemoryStore::new(), 0.0);

        let consistent = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&consistent);
        let _sub = svc.subscribe(move |event, cache| {
            if let DashboardEvent::Kpis(snapshot) = event {
                let cached = cache.kpis.as_ref().map(|kpis| kpis.total_pothole);
                if cached != Some(snapshot.total_pothole) {
                    flag.store(false, Ordering::SeqCst);
                }
            }
        });

        svc.start_session("S1").await;
        run_for(20).await;
        assert!(consistent.load(Ordering::SeqCst));
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failures_do_not_stop_the_timers() {
        let feed = StubFeed::default();
        feed.state.fail_kpis.store(true, Ordering::SeqCst);
        let svc = service(feed.clone(), MemoryStore::new(), 0.0);

        svc.start_session("S1").await;
        run_for(20).await;
        assert!(svc.cached_data().kpis.is_none());
        assert!(svc.metrics().errors >= 3);

        feed.state.fail_kpis.store(false, Ordering::SeqCst);
        run_for(10).await;
        assert!(svc.cached_data().kpis.is_some());
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn geolocation_failure_skips_the_push() {
        let feed = StubFeed::default();
        let svc = DashboardService::new(feed.clone(), BrokenGeo, MemoryStore::new(), config(0.0));

        svc.start_session("S1").await;
        run_for(10).await;
        assert_eq!(feed.push_count(), 0);
        // KPI polling is unaffected.
        assert_eq!(feed.kpi_sessions().len(), 2);
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn gps_push_can_amortize_a_location_refresh() {
        let feed = StubFeed::default();
        let svc = service(feed.clone(), MemoryStore::new(), 1.0);

        svc.start_session("S1").await;
        run_for(5).await;
        // Initial fetch plus the refresh piggybacked on the first GPS push.
        assert_eq!(feed.location_sessions().len(), 2);
        assert_eq!(feed.push_count(), 1);
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn resume_requires_matching_live_marker() {
        let feed = StubFeed::default();
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_DASHBOARD_SESSION, "S9");
        store.set(keys::LIVE_SESSION_ID, "S9");
        let svc = service(feed.clone(), store, 0.0);

        svc.resume_session_if_exists().await;
        assert!(svc.is_running());
        assert_eq!(feed.kpi_sessions(), vec!["S9"]);
        svc.stop_session();
    }

    #[tokio::test(start_paused = true)]
    async fn stale_dashboard_marker_is_cleared_instead_of_resumed() {
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_DASHBOARD_SESSION, "S9");
        let svc = service(StubFeed::default(), store.clone(), 0.0);

        svc.resume_session_if_exists().await;
        assert!(!svc.is_running());
        assert_eq!(store.get(keys::ACTIVE_DASHBOARD_SESSION), None);
    }

    #[tokio::test(start_paused = true)]
    async fn mismatched_markers_do_not_resume() {
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_DASHBOARD_SESSION, "S9");
        store.set(keys::LIVE_SESSION_ID, "S10");
        let svc = service(StubFeed::default(), store.clone(), 0.0);

        svc.resume_session_if_exists().await;
        assert!(!svc.is_running());
        // The dashboard marker is left alone when a live session exists.
        assert_eq!(store.get(keys::ACTIVE_DASHBOARD_SESSION).as_deref(), Some("S9"));
    }

    #[tokio::test(start_paused = true)]
    async fn active_session_falls_back_to_the_durable_marker() {
        let store = MemoryStore::new();
        store.set(keys::ACTIVE_DASHBOARD_SESSION, "S7");
        let svc = service(StubFeed::default(), store, 0.0);
        assert_eq!(svc.active_session().as_deref(), Some("S7"));
        assert!(!svc.is_running());
    }

    #[test]
    fn watermark_rejects_lower_sequence_numbers() {
        let watermark = AtomicU64::new(0);
        assert!(advance_watermark(&watermark, 3));
        assert!(!advance_watermark(&watermark, 2));
        assert!(advance_watermark(&watermark, 4));
    }

    #[tokio::test]
    async fn stale_kpi_response_does_not_clobber_a_newer_one() {
        let svc = service(StubFeed::default(), MemoryStore::new(), 0.0);
        let newer = KpiSnapshot {
            total_pothole: 9,
            ..Default::default()
        };
        let older = KpiSnapshot {
            total_pothole: 4,
            ..Default::default()
        };

        svc.inner.apply_kpis(2, newer);
        svc.inner.apply_kpis(1, older);
        assert_eq!(svc.cached_data().kpis.map(|k| k.total_pothole), Some(9));
    }
}
