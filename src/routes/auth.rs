use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::app_state::AppState;
use crate::models::user::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

/// Bearer token claims. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

/// Issues and verifies HS256 bearer tokens.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
        }
    }

    /// Signed token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: chrono::Utc::now().timestamp() as u64 + self.ttl_secs,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Resolve a token to the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized
        })?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::Unauthorized)
    }
}

/// POST /api/v1/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user = state.accounts.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            user_id: user.id,
        }),
    ))
}

/// POST /api/v1/login — exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user = state
        .accounts
        .authenticate(&request.username, &request.password)
        .await?;
    let token = state.jwt.issue(user.id)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        token,
        username: user.username,
    }))
}

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        state.jwt.verify(token.trim()).map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(secret: &str, sub: &str, exp: u64) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> u64 {
        (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as u64
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let keys = JwtKeys::new("secret", 3600);
        let user = keys
            .verify(&token("secret", &user_id.to_string(), in_one_hour()))
            .unwrap();
        assert_eq!(user, user_id);
    }

    #[test]
    fn test_wrong_secret() {
        let keys = JwtKeys::new("secret", 3600);
        let result = keys.verify(&token("other", &Uuid::new_v4().to_string(), in_one_hour()));
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::new("secret", 3600);
        let result = keys.verify(&token("secret", &Uuid::new_v4().to_string(), 1));
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_issued_token_verifies() {
        let keys = JwtKeys::new("secret", 3600);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();

        assert_eq!(keys.verify(&token).unwrap(), user_id);
        assert!(matches!(
            JwtKeys::new("other", 3600).verify(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_subject_must_be_uuid() {
        let keys = JwtKeys::new("secret", 3600);
        let result = keys.verify(&token("secret", "admin", in_one_hour()));
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }
}
