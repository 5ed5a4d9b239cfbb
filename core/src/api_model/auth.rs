use serde::{Deserialize, Serialize};

/// Payload for `POST /signup` and `POST /admin/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub country_code: String,
    pub mobile_number: String,
}

/// Profile record stored after login and returned by the user admin APIs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub country_code: String,
    pub mobile_number: String,
}

/// Response from `POST /login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Generic acknowledgement body used by the OTP and password endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    pub message: String,
}
