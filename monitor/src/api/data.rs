use roadcore::api_model::{KpiSnapshot, LocationsResponse, PotholeDetails, PotholeLocation};

use crate::api::client::{ApiClient, ApiResult};

impl ApiClient {
    pub async fn severity_data(&self, session_id: &str) -> ApiResult<KpiSnapshot> {
        self.fetch_json(self.get(&format!("/severity_distance_pothole/{}", session_id)))
            .await
    }

    pub async fn pothole_locations(&self, session_id: &str) -> ApiResult<Vec<PotholeLocation>> {
        let response: LocationsResponse = self
            .fetch_json(self.get(&format!("/get_pothole_locations/{}", session_id)))
            .await?;
        Ok(response.locations)
    }

    pub async fn pothole_details(&self, session_id: &str) -> ApiResult<PotholeDetails> {
        self.fetch_json(self.get(&format!("/pothole_details/{}", session_id)))
            .await
    }

    /// Raw per-frame cumulative count table, delimited text.
    pub async fn detection_csv(&self, session_id: &str) -> ApiResult<String> {
        Ok(self
            .send(self.get(&format!("/get_csv/{}", session_id)))
            .await?
            .text()
            .await?)
    }
}
