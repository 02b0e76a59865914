use serde::{Deserialize, Serialize};

use crate::auth::store::Role;

/// Request body for POST /auth/sign-up.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub name: String,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub password: String,
}

/// Request body for POST /auth/log-in.
#[derive(Debug, Deserialize)]
pub struct LogInRequest {
    pub email: String,
    pub password: String,
}

/// Body for responses that only carry a confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// The request-scoped identity, as returned by GET /auth/me.
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: String,
    pub name: String,
    pub role: Role,
}
