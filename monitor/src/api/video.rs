use roadcore::api_model::VideoInfo;

use crate::api::client::{ApiClient, ApiResult};

impl ApiClient {
    pub async fn video_info(&self, session_id: &str) -> ApiResult<VideoInfo> {
        self.fetch_json(self.get(&format!("/video_info/{}", session_id)))
            .await
    }

    /// MJPEG feed of the in-progress session, for handing to a player.
    pub fn video_feed_url(&self, session_id: &str) -> String {
        self.url(&format!("/video_feed?session_id={}", session_id))
    }

    pub fn stream_url(&self, session_id: &str) -> String {
        self.url(&format!("/stream_processed_video/{}", session_id))
    }

    pub fn download_url(&self, session_id: &str) -> String {
        self.url(&format!("/download_processed_video/{}", session_id))
    }

    pub async fn download_processed(&self, session_id: &str) -> ApiResult<Vec<u8>> {
        let response = self
            .send(self.get(&format!("/download_processed_video/{}", session_id)))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }
}
