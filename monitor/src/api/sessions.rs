use reqwest::multipart::{Form, Part};
use std::path::PathBuf;

use roadcore::api_model::{ProcessingStatus, StartSessionResponse};

use crate::api::client::{ApiClient, ApiResult};

/// What the detection backend should process: an uploaded file or a
/// stream/video URL it can pull itself.
#[derive(Debug, Clone)]
pub enum SessionSource {
    File(PathBuf),
    Url(String),
}

impl ApiClient {
    /// Starts a detection session. The backend takes a multipart form with
    /// the source, the detection category, and optionally the user's email
    /// for alerting.
    pub async fn start_session(
        &self,
        source: &SessionSource,
        email: Option<&str>,
        category: &str,
    ) -> ApiResult<StartSessionResponse> {
        let mut form = Form::new().text("category", category.to_string());
        form = match source {
            SessionSource::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload.mp4".to_string());
                form.part("file", Part::bytes(bytes).file_name(file_name))
            }
            SessionSource::Url(url) => form.text("source_url", url.clone()),
        };
        if let Some(email) = email {
            form = form.text("user_email", email.to_string());
        }

        self.fetch_json(self.post("/start_session").multipart(form))
            .await
    }

    pub async fn stop_session(&self, session_id: &str) -> ApiResult<()> {
        self.send(self.post(&format!("/stop_session?session_id={}", session_id)))
            .await
            .map(|_| ())
    }

    pub async fn processing_status(&self, session_id: &str) -> ApiResult<ProcessingStatus> {
        self.fetch_json(self.get(&format!("/processing_status/{}", session_id)))
            .await
    }

    /// Forwards the client position. One-directional; the backend never
    /// reports a position back.
    pub async fn update_location(&self, session_id: &str, lat: f64, lng: f64) -> ApiResult<()> {
        let form = Form::new()
            .text("lat", lat.to_string())
            .text("lng", lng.to_string());
        self.send(
            self.post(&format!("/update_location/{}", session_id))
                .multipart(form),
        )
        .await
        .map(|_| ())
    }
}
