use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, LoginResponse, Role, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::extract_bearer_token;

use crate::services::{LoginService, TokenService};

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Path(role): Path<String>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let role = role
        .parse::<Role>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let response = LoginService::new(&config)?.login(role, request).await?;

    Ok(Json(response))
}

/// Reports whether the bearer token is currently valid for `role`.
#[axum::debug_handler]
pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token for role {}", role);

    let token = extract_bearer_token(&headers)?;
    let valid = TokenService::new(&config)?.validate(&token, &role).await;

    Ok(Json(TokenResponse { valid }))
}
