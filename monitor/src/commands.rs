use anyhow::{bail, Context};
use log::{error, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;

use roadcore::analytics::{build_charts, format_count_tick, y_axis_domain, DetectionTable};
use roadcore::api_model::{SignupRequest, ThresholdRow};
use roadcore::service::keys;
use roadcore::severity::severity_class;
use roadcore::validation::{is_strong_password, is_valid_email, is_valid_phone};
use roadcore::{DashboardEvent, DashboardService, SessionStore};

use crate::api::{ApiClient, SessionSource};
use crate::config::MonitorConfig;
use crate::geo::{ClientGeoSource, FixedGeoSource, TrackGeoSource};
use crate::storage::FileStore;

type WatchService = DashboardService<ApiClient, ClientGeoSource, Arc<FileStore>>;

const REPORT_PATH: &str = "reports/session_watch.log";

pub async fn login(client: &ApiClient, email: &str, password: &str) -> anyhow::Result<()> {
    let response = client.login(email, password).await?;
    println!(
        "Logged in as {} ({})",
        response.user.email, response.user.role
    );
    Ok(())
}

pub struct SignupArgs {
    pub email: String,
    pub password: String,
    pub name: String,
    pub country_code: String,
    pub mobile: String,
    pub admin: bool,
}

/// Validates the form locally before submitting, the same gate the signup
/// screen applies.
pub async fn signup(client: &ApiClient, args: SignupArgs) -> anyhow::Result<()> {
    if !is_valid_email(&args.email) {
        bail!("Please enter a valid email address");
    }
    if !is_strong_password(&args.password) {
        bail!("Password must be at least 8 characters with uppercase, lowercase, number, and special character");
    }
    if !is_valid_phone(&args.mobile) {
        bail!("Please enter a valid 10-digit mobile number");
    }

    let request = SignupRequest {
        email: args.email.clone(),
        password: args.password.clone(),
        confirm_password: args.password,
        name: args.name,
        country_code: args.country_code,
        mobile_number: args.mobile,
    };
    let response = if args.admin {
        client.admin_register(&request).await?
    } else {
        client.signup(&request).await?
    };
    println!("{}", display_message(&response.message, "Signup submitted; verify the OTP sent to your email"));
    Ok(())
}

pub async fn verify_otp(client: &ApiClient, email: &str, otp: &str) -> anyhow::Result<()> {
    let response = client.verify_otp(email, otp).await?;
    println!("{}", display_message(&response.message, "Account verified"));
    Ok(())
}

pub async fn resend_otp(client: &ApiClient, email: &str) -> anyhow::Result<()> {
    let response = client.resend_otp(email).await?;
    println!("{}", display_message(&response.message, "OTP resent"));
    Ok(())
}

pub async fn forgot_password(client: &ApiClient, email: &str) -> anyhow::Result<()> {
    let response = client.forgot_password(email).await?;
    println!("{}", display_message(&response.message, "Reset OTP sent"));
    Ok(())
}

pub async fn reset_password(
    client: &ApiClient,
    email: &str,
    otp: &str,
    password: &str,
) -> anyhow::Result<()> {
    if !is_strong_password(password) {
        bail!("Password must be at least 8 characters with uppercase, lowercase, number, and special character");
    }
    let response = client.reset_password(email, otp, password).await?;
    println!("{}", display_message(&response.message, "Password reset"));
    Ok(())
}

pub async fn logout(client: &ApiClient, store: &Arc<FileStore>) -> anyhow::Result<()> {
    let email = store
        .get(keys::USER_EMAIL)
        .context("not logged in (no stored email)")?;
    if let Err(err) = client.logout(&email).await {
        // Local credentials are dropped regardless.
        error!("logout request failed: {}", err);
    }
    println!("Logged out {}", email);
    Ok(())
}

/// Starts a detection session on the backend, registers it as the live
/// session, then watches it until Ctrl+C, stopping it server-side on exit.
pub async fn start(
    client: &ApiClient,
    store: Arc<FileStore>,
    config: &MonitorConfig,
    source: &str,
    email: Option<String>,
    category: Option<String>,
    track: Option<PathBuf>,
) -> anyhow::Result<()> {
    let source = if source.starts_with("http://") || source.starts_with("https://") {
        SessionSource::Url(source.to_string())
    } else {
        SessionSource::File(PathBuf::from(source))
    };
    let category = category
        .or_else(|| store.get(keys::SELECTED_CATEGORY))
        .unwrap_or_else(|| config.default_category.clone());
    let email = email.or_else(|| store.get(keys::USER_EMAIL));

    let response = client
        .start_session(&source, email.as_deref(), &category)
        .await?;
    let session_id = response.session_id;
    store.set(keys::LIVE_SESSION_ID, &session_id);
    store.set(keys::SELECTED_CATEGORY, &category);
    println!("Session {} started ({})", session_id, category);

    let service = build_service(client, &store, config, track)?;
    run_until_interrupted(&service, &session_id).await?;

    if let Err(err) = client.stop_session(&session_id).await {
        error!("stopping session {}: {}", session_id, err);
    }
    store.remove(keys::LIVE_SESSION_ID);
    Ok(())
}

/// Attaches to an already-running session and keeps its telemetry fresh
/// until Ctrl+C. The session keeps running server-side afterwards.
pub async fn watch(
    client: &ApiClient,
    store: Arc<FileStore>,
    config: &MonitorConfig,
    session_id: Option<String>,
    track: Option<PathBuf>,
) -> anyhow::Result<()> {
    let service = build_service(client, &store, config, track)?;
    match session_id {
        Some(session_id) => {
            run_until_interrupted(&service, &session_id).await?;
        }
        None => {
            // No explicit id: only resume when the persisted markers agree.
            service.resume_session_if_exists().await;
            let Some(session_id) = service.active_session() else {
                bail!("no live session to watch; pass --session-id or run `start`");
            };
            run_until_interrupted(&service, &session_id).await?;
        }
    }
    Ok(())
}

pub async fn snapshot(
    client: &ApiClient,
    store: &Arc<FileStore>,
    session_id: Option<String>,
) -> anyhow::Result<()> {
    let session_id = resolve_session(store, session_id)?;
    let kpis = client.severity_data(&session_id).await?;
    let details = client.pothole_details(&session_id).await?;
    let status = client.processing_status(&session_id).await?;

    println!("Session {}", session_id);
    println!("  Potholes:   {}", kpis.total_pothole);
    println!(
        "  Distance:   {:.3} km ({:.0} m)",
        kpis.distance_km, kpis.distance_meters
    );
    println!(
        "  Severity:   {:.2} ({}, band {})",
        kpis.severity,
        kpis.severity_level,
        severity_class(kpis.severity).as_str()
    );
    println!(
        "  Markers:    {} (avg confidence {:.2})",
        details.potholes.len(),
        details.average_confidence
    );
    println!(
        "  Processing: complete={} video_ready={}",
        status.processing_complete, status.video_ready
    );
    Ok(())
}

/// Fetches the per-frame CSV and prints the chart-ready shapes the
/// analytics dashboard would render.
pub async fn analytics(
    client: &ApiClient,
    store: &Arc<FileStore>,
    session_id: Option<String>,
) -> anyhow::Result<()> {
    let session_id = resolve_session(store, session_id)?;
    let text = client.detection_csv(&session_id).await?;
    let table = DetectionTable::parse(&text)?;
    let bundle = build_charts(&table);

    if bundle.bar.categories.is_empty() {
        println!("No detections recorded for session {}", session_id);
        return Ok(());
    }

    println!("Cumulative detections (session {}):", session_id);
    for (name, value) in bundle.bar.categories.iter().zip(&bundle.bar.values) {
        println!("  {:<24} {:>8}", name, format_count_tick(*value));
    }

    let total: u64 = bundle.pie.values.iter().sum();
    if total > 0 {
        let shares: Vec<String> = bundle
            .pie
            .labels
            .iter()
            .zip(bundle.pie.values.iter().zip(&bundle.pie.colors))
            .map(|(name, (value, color))| {
                format!("{} {:.1}% ({})", name, *value as f64 * 100.0 / total as f64, color)
            })
            .collect();
        println!("Breakdown: {}", shares.join(", "));
        println!("Donut classes: {}", bundle.donut.labels.join(", "));
    }

    let peak = bundle
        .trend
        .series
        .iter()
        .flat_map(|series| series.points.iter().copied())
        .max()
        .unwrap_or(0);
    let (_, y_max) = y_axis_domain(peak);
    println!(
        "Trend: {} classes over {} sample points (y-axis 0..{})",
        bundle.trend.series.len(),
        bundle.trend.frames.len(),
        y_max
    );
    Ok(())
}

pub async fn history(
    client: &ApiClient,
    user_id: &str,
    limit: Option<u32>,
    status: Option<String>,
) -> anyhow::Result<()> {
    let sessions = client
        .user_sessions(user_id, limit, status.as_deref())
        .await?;
    if sessions.is_empty() {
        println!("No sessions recorded for user {}", user_id);
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}  {:<12} {:>5} potholes  {:.3} km",
            session.session_id,
            session.started_at,
            session.status,
            session.total_potholes,
            session.distance_km
        );
    }
    Ok(())
}

pub async fn session_info(client: &ApiClient, session_id: &str) -> anyhow::Result<()> {
    let details = client.session_details(session_id).await?;
    let potholes = client.session_potholes(session_id).await?;
    let track = client.gps_track(session_id).await?;
    let video = client.video_info(session_id).await?;

    println!("Session {} ({})", details.session_id, details.category);
    println!("  User:      {}", details.user_email);
    println!(
        "  Window:    {} .. {}",
        details.started_at,
        details.ended_at.as_deref().unwrap_or("ongoing")
    );
    println!("  Status:    {}", details.status);
    println!(
        "  Severity:  {:.2} ({}, band {})",
        details.severity,
        details.severity_level,
        severity_class(details.severity).as_str()
    );
    println!(
        "  Potholes:  {} recorded, {} GPS track points",
        potholes.len(),
        track.points.len()
    );
    if video.available {
        println!(
            "  Video:     {} bytes at {}",
            video.size_bytes,
            client.stream_url(session_id)
        );
    } else {
        println!("  Video:     not ready");
    }
    Ok(())
}

pub async fn delete_session(client: &ApiClient, session_id: &str) -> anyhow::Result<()> {
    client.delete_session(session_id).await?;
    println!("Session {} deleted", session_id);
    Ok(())
}

pub async fn video(
    client: &ApiClient,
    session_id: &str,
    download: Option<PathBuf>,
) -> anyhow::Result<()> {
    let info = client.video_info(session_id).await?;
    if !info.available {
        bail!("processed video for session {} is not ready", session_id);
    }
    println!("Feed URL:     {}", client.video_feed_url(session_id));
    println!("Stream URL:   {}", client.stream_url(session_id));
    println!("Download URL: {}", client.download_url(session_id));

    if let Some(path) = download {
        let bytes = client.download_processed(session_id).await?;
        fs::write(&path, &bytes)
            .with_context(|| format!("writing video to {}", path.display()))?;
        println!("Saved {} bytes to {}", bytes.len(), path.display());
    }
    Ok(())
}

pub async fn list_users(client: &ApiClient) -> anyhow::Result<()> {
    for user in client.list_users().await? {
        println!("{}  {:<28} {:<10} {}", user.id, user.email, user.role, user.name);
    }
    Ok(())
}

pub async fn show_user(client: &ApiClient, user_id: &str) -> anyhow::Result<()> {
    let user = client.get_user(user_id).await?;
    println!("{} <{}>", user.name, user.email);
    println!("  Role:   {}", user.role);
    println!("  Mobile: {} {}", user.country_code, user.mobile_number);
    Ok(())
}

pub async fn update_user(
    client: &ApiClient,
    user_id: &str,
    name: Option<String>,
    role: Option<String>,
) -> anyhow::Result<()> {
    let mut user = client.get_user(user_id).await?;
    if let Some(name) = name {
        user.name = name;
    }
    if let Some(role) = role {
        user.role = role;
    }
    let response = client.update_user(user_id, &user).await?;
    println!("{}", display_message(&response.message, "User updated"));
    Ok(())
}

pub async fn delete_user(client: &ApiClient, user_id: &str) -> anyhow::Result<()> {
    client.delete_user(user_id).await?;
    println!("User {} deleted", user_id);
    Ok(())
}

pub async fn thresholds(
    client: &ApiClient,
    store: &Arc<FileStore>,
    region: Option<String>,
    set_from: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(path) = set_from {
        let region = region
            .or_else(|| store.get(keys::SELECTED_REGION))
            .context("--region is required when updating thresholds")?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading thresholds file {}", path.display()))?;
        let rows: Vec<ThresholdRow> = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing thresholds file {}", path.display()))?;
        client.put_thresholds(&region, &rows).await?;
        store.set(keys::SELECTED_REGION, &region);
        println!("Thresholds for {} saved ({} bands)", region, rows.len());
        return Ok(());
    }

    let all = client.thresholds().await?;
    for (name, rows) in all {
        if let Some(filter) = &region {
            if &name != filter {
                continue;
            }
        }
        println!("{}:", name);
        for row in rows {
            println!(
                "  {:>6.1} .. {:>6.1}  {:<12} {}",
                row.min, row.max, row.status, row.action
            );
        }
    }
    Ok(())
}

fn resolve_session(store: &Arc<FileStore>, session_id: Option<String>) -> anyhow::Result<String> {
    session_id
        .or_else(|| store.get(keys::LIVE_SESSION_ID))
        .context("no live session; pass a session id or run `start`")
}

fn build_service(
    client: &ApiClient,
    store: &Arc<FileStore>,
    config: &MonitorConfig,
    track: Option<PathBuf>,
) -> anyhow::Result<WatchService> {
    let geo = match track {
        Some(path) => ClientGeoSource::Track(TrackGeoSource::from_path(path)?),
        None => ClientGeoSource::Fixed(FixedGeoSource::new(config.default_lat, config.default_lng)),
    };
    Ok(DashboardService::new(
        client.clone(),
        geo,
        Arc::clone(store),
        config.service_config(),
    ))
}

async fn run_until_interrupted(service: &WatchService, session_id: &str) -> anyhow::Result<()> {
    let _subscription = service.subscribe(|event, _cache| match event {
        DashboardEvent::Kpis(kpis) => println!(
            "KPIs: {} potholes over {:.3} km (severity {:.2}, {})",
            kpis.total_pothole, kpis.distance_km, kpis.severity, kpis.severity_level
        ),
        DashboardEvent::Potholes(locations) => {
            println!("Pothole locations: {} markers", locations.len())
        }
        DashboardEvent::Location(fix) => println!(
            "Position pushed: {:.4}, {:.4}{}",
            fix.lat,
            fix.lng,
            if fix.fallback {
                " (GPS disabled, using default)"
            } else {
                ""
            }
        ),
    });

    service.start_session(session_id).await;
    println!("Watching session {} (Ctrl+C to stop)...", session_id);
    signal::ctrl_c().await.context("awaiting Ctrl+C")?;
    service.stop_session();
    write_summary(service, session_id)?;
    Ok(())
}

/// Prints the final cache state and appends one report line, so repeated
/// runs accumulate a local log of watched sessions.
fn write_summary(service: &WatchService, session_id: &str) -> anyhow::Result<()> {
    let cache = service.cached_data();
    let stats = service.metrics();

    let (potholes, distance_km, severity) = cache
        .kpis
        .as_ref()
        .map(|kpis| (kpis.total_pothole, kpis.distance_km, kpis.severity))
        .unwrap_or((0, 0.0, 0.0));
    println!(
        "Final: {} potholes, {:.3} km, severity {:.2} ({}), {} markers cached",
        potholes,
        distance_km,
        severity,
        severity_class(severity).as_str(),
        cache.pothole_locations.len()
    );
    info!(
        "poll stats: {} KPI updates, {} location updates, {} pushes, {} errors",
        stats.kpi_updates, stats.location_updates, stats.position_pushes, stats.errors
    );

    let report = format!(
        "session={} potholes={} distance_km={:.3} severity={:.2} kpi_updates={} location_updates={} pushes={} errors={}\n",
        session_id,
        potholes,
        distance_km,
        severity,
        stats.kpi_updates,
        stats.location_updates,
        stats.position_pushes,
        stats.errors
    );
    let report_path = Path::new(REPORT_PATH);
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(report_path)?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

fn display_message<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}
