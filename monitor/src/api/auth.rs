use serde_json::json;

use roadcore::api_model::{LoginResponse, MessageResponse, SignupRequest};
use roadcore::service::keys;

use crate::api::client::{ApiClient, ApiResult};

impl ApiClient {
    pub async fn signup(&self, request: &SignupRequest) -> ApiResult<MessageResponse> {
        self.fetch_json(self.post("/signup").json(request)).await
    }

    pub async fn admin_register(&self, request: &SignupRequest) -> ApiResult<MessageResponse> {
        self.fetch_json(self.post("/admin/register").json(request))
            .await
    }

    /// Logs in and persists the token plus profile so later commands (and
    /// the background service) run authenticated.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let response: LoginResponse = self
            .fetch_json(
                self.post("/login")
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let store = self.store();
        store.set(keys::TOKEN, &response.token);
        store.set(keys::USER_EMAIL, &response.user.email);
        store.set(keys::USER_ROLE, &response.user.role);
        if let Ok(profile) = serde_json::to_string(&response.user) {
            store.set(keys::USER, &profile);
        }
        Ok(response)
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> ApiResult<MessageResponse> {
        self.fetch_json(
            self.post("/verify-otp")
                .json(&json!({ "email": email, "otp": otp })),
        )
        .await
    }

    pub async fn resend_otp(&self, email: &str) -> ApiResult<MessageResponse> {
        self.fetch_json(self.post("/resend-otp").json(&json!({ "email": email })))
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<MessageResponse> {
        self.fetch_json(self.post("/forgot-password").json(&json!({ "email": email })))
            .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> ApiResult<MessageResponse> {
        self.fetch_json(self.post("/reset-password").json(&json!({
            "email": email,
            "otp": otp,
            "new_password": new_password,
        })))
        .await
    }

    /// Logs out server-side, then drops the locally stored credentials
    /// whether or not the backend call succeeded.
    pub async fn logout(&self, email: &str) -> ApiResult<()> {
        let result = self
            .send(self.post("/logout").json(&json!({ "email": email })))
            .await;

        let store = self.store();
        store.remove(keys::TOKEN);
        store.remove(keys::USER);
        store.remove(keys::USER_EMAIL);
        store.remove(keys::USER_ROLE);
        result.map(|_| ())
    }
}
