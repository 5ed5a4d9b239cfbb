mod api;
mod commands;
mod config;
mod geo;
mod storage;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use roadcore::SessionStore;

use crate::api::ApiClient;
use crate::commands::SignupArgs;
use crate::config::MonitorConfig;
use crate::storage::FileStore;

#[derive(Parser)]
#[command(name = "roadmonitor")]
#[command(about = "Terminal client for the road-defect detection backend")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration file
    #[arg(long)]
    base_url: Option<String>,

    /// Where credentials and session markers are persisted
    #[arg(long, default_value = "monitor_state.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the bearer token
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account (validated locally before submission)
    Signup {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "+91")]
        country_code: String,
        #[arg(long)]
        mobile: String,
        /// Register through the admin endpoint
        #[arg(long)]
        admin: bool,
    },
    /// Verify the OTP sent after signup
    VerifyOtp { email: String, otp: String },
    /// Request a fresh signup OTP
    ResendOtp { email: String },
    /// Request a password-reset OTP
    ForgotPassword { email: String },
    /// Reset the password using an OTP
    ResetPassword {
        email: String,
        otp: String,
        #[arg(long)]
        password: String,
    },
    /// Drop stored credentials
    Logout,
    /// Start a detection session from a video file or URL and watch it
    Start {
        /// Video file path, or an http(s) stream URL
        source: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replay positions from a lat,lng track file instead of the default
        #[arg(long)]
        track: Option<PathBuf>,
    },
    /// Attach to a running session and stream its telemetry
    Watch {
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long)]
        track: Option<PathBuf>,
    },
    /// One-shot KPI and marker summary for a session
    Snapshot {
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Chart-ready breakdown of the session's detection CSV
    Analytics {
        #[arg(long)]
        session_id: Option<String>,
    },
    /// List a user's past sessions
    History {
        user_id: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Full record of one session, including GPS track and video state
    SessionInfo { session_id: String },
    /// Delete a session and its artifacts
    DeleteSession { session_id: String },
    /// Processed-video URLs, optionally downloading the file
    Video {
        session_id: String,
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// User administration (requires an admin token)
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Show or update per-region pothole thresholds
    Thresholds {
        #[arg(long)]
        region: Option<String>,
        /// YAML file of threshold bands to upload for --region
        #[arg(long)]
        set_from: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    List,
    Show {
        user_id: String,
    },
    Update {
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    Delete {
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    debug!("using backend {}", config.base_url);

    let store = Arc::new(
        FileStore::open(&args.state_file)
            .with_context(|| format!("opening state file {}", args.state_file.display()))?,
    );
    let client = ApiClient::new(&config.base_url, store.clone() as Arc<dyn SessionStore>);

    match args.command {
        Command::Login { email, password } => commands::login(&client, &email, &password).await,
        Command::Signup {
            email,
            password,
            name,
            country_code,
            mobile,
            admin,
        } => {
            commands::signup(
                &client,
                SignupArgs {
                    email,
                    password,
                    name,
                    country_code,
                    mobile,
                    admin,
                },
            )
            .await
        }
        Command::VerifyOtp { email, otp } => commands::verify_otp(&client, &email, &otp).await,
        Command::ResendOtp { email } => commands::resend_otp(&client, &email).await,
        Command::ForgotPassword { email } => commands::forgot_password(&client, &email).await,
        Command::ResetPassword {
            email,
            otp,
            password,
        } => commands::reset_password(&client, &email, &otp, &password).await,
        Command::Logout => commands::logout(&client, &store).await,
        Command::Start {
            source,
            email,
            category,
            track,
        } => commands::start(&client, store, &config, &source, email, category, track).await,
        Command::Watch { session_id, track } => {
            commands::watch(&client, store, &config, session_id, track).await
        }
        Command::Snapshot { session_id } => commands::snapshot(&client, &store, session_id).await,
        Command::Analytics { session_id } => commands::analytics(&client, &store, session_id).await,
        Command::History {
            user_id,
            limit,
            status,
        } => commands::history(&client, &user_id, limit, status).await,
        Command::SessionInfo { session_id } => commands::session_info(&client, &session_id).await,
        Command::DeleteSession { session_id } => {
            commands::delete_session(&client, &session_id).await
        }
        Command::Video {
            session_id,
            download,
        } => commands::video(&client, &session_id, download).await,
        Command::Users { action } => match action {
            UserAction::List => commands::list_users(&client).await,
            UserAction::Show { user_id } => commands::show_user(&client, &user_id).await,
            UserAction::Update {
                user_id,
                name,
                role,
            } => commands::update_user(&client, &user_id, name, role).await,
            UserAction::Delete { user_id } => commands::delete_user(&client, &user_id).await,
        },
        Command::Thresholds { region, set_from } => {
            commands::thresholds(&client, &store, region, set_from).await
        }
    }
}
