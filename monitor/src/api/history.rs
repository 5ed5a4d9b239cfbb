use roadcore::api_model::{GpsTrack, LocationsResponse, PotholeLocation, SessionDetails, SessionSummary};

use crate::api::client::{ApiClient, ApiResult};

impl ApiClient {
    pub async fn user_sessions(
        &self,
        user_id: &str,
        limit: Option<u32>,
        status: Option<&str>,
    ) -> ApiResult<Vec<SessionSummary>> {
        let mut request = self.get(&format!("/user/sessions/{}", user_id));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }
        if let Some(status) = status {
            request = request.query(&[("status", status)]);
        }
        self.fetch_json(request).await
    }

    pub async fn session_details(&self, session_id: &str) -> ApiResult<SessionDetails> {
        self.fetch_json(self.get(&format!("/session/details/{}", session_id)))
            .await
    }

    pub async fn session_potholes(&self, session_id: &str) -> ApiResult<Vec<PotholeLocation>> {
        let response: LocationsResponse = self
            .fetch_json(self.get(&format!("/session/potholes/{}", session_id)))
            .await?;
        Ok(response.locations)
    }

    pub async fn gps_track(&self, session_id: &str) -> ApiResult<GpsTrack> {
        self.fetch_json(self.get(&format!("/session/gps_track/{}", session_id)))
            .await
    }

    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        self.send(self.delete(&format!("/session/{}", session_id)))
            .await
            .map(|_| ())
    }
}
