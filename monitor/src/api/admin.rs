use roadcore::api_model::{MessageResponse, ThresholdMap, ThresholdRow, UserProfile};

use crate::api::client::{ApiClient, ApiResult};

impl ApiClient {
    pub async fn list_users(&self) -> ApiResult<Vec<UserProfile>> {
        self.fetch_json(self.get("/users")).await
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<UserProfile> {
        self.fetch_json(self.get(&format!("/users/{}", user_id)))
            .await
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> ApiResult<MessageResponse> {
        self.fetch_json(self.put(&format!("/users/{}", user_id)).json(profile))
            .await
    }

    pub async fn delete_user(&self, user_id: &str) -> ApiResult<()> {
        self.send(self.delete(&format!("/users/{}", user_id)))
            .await
            .map(|_| ())
    }

    pub async fn thresholds(&self) -> ApiResult<ThresholdMap> {
        self.fetch_json(self.get("/api/thresholds/")).await
    }

    pub async fn put_thresholds(
        &self,
        region: &str,
        rows: &[ThresholdRow],
    ) -> ApiResult<()> {
        self.send(self.put(&format!("/api/thresholds/{}", region)).json(&rows))
            .await
            .map(|_| ())
    }
}
