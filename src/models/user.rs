use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account owning uploads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// A user together with the stored Argon2 password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password_hash: String,
}

/// POST /api/v1/register body.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 50))]
    pub username: String,

    #[garde(email, length(max = 255))]
    pub email: String,

    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// POST /api/v1/login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}
