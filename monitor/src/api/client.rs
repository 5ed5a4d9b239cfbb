use async_trait::async_trait;
use log::warn;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use roadcore::api_model::{KpiSnapshot, PotholeLocation};
use roadcore::service::keys;
use roadcore::{FeedError, FeedResult, SessionStore, TelemetryFeed};

/// Errors surfaced by backend calls.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("reading upload source: {0}")]
    Io(#[from] std::io::Error),
    #[error("authentication expired")]
    AuthExpired,
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP client for the detection backend. Attaches the stored bearer token
/// to every request; a 401 clears the token so the next command lands on
/// the login path instead of retrying with dead credentials.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path))
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let request = match self.store.get(keys::TOKEN) {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("session expired, clearing stored token");
            self.store.remove(keys::TOKEN);
            return Err(ApiError::AuthExpired);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Backend {
                status,
                message: extract_message(&body),
            });
        }
        Ok(response)
    }

    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }
}

/// Pulls a human-readable message out of an error body when the backend
/// sent one, falling back to the raw text.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|entry| entry.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_string()
    } else {
        trimmed.to_string()
    }
}

fn feed_error(err: ApiError) -> FeedError {
    match err {
        ApiError::AuthExpired => FeedError::AuthExpired,
        ApiError::Backend { status, message } => {
            FeedError::Rejected(format!("{}: {}", status, message))
        }
        other => FeedError::Transport(other.to_string()),
    }
}

#[async_trait]
impl TelemetryFeed for ApiClient {
    async fn fetch_kpis(&self, session_id: &str) -> FeedResult<KpiSnapshot> {
        self.severity_data(session_id).await.map_err(feed_error)
    }

    async fn fetch_locations(&self, session_id: &str) -> FeedResult<Vec<PotholeLocation>> {
        self.pothole_locations(session_id).await.map_err(feed_error)
    }

    async fn push_position(&self, session_id: &str, lat: f64, lng: f64) -> FeedResult<()> {
        self.update_location(session_id, lat, lng)
            .await
            .map_err(feed_error)
    }
}
