use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::auth::{Role, UserRecord};
use shared_models::error::AppError;
use shared_utils::extractor::extract_bearer_token;
use shared_utils::jwt::{TokenAuthority, TokenError};

use crate::services::lookup::{UserDirectory, UserLookup};

/// Token issuance plus role checks against the current stored accounts.
#[derive(Clone)]
pub struct TokenService {
    authority: TokenAuthority,
    directory: UserDirectory,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let authority = TokenAuthority::from_config(config)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self::with_directory(authority, UserDirectory::supabase(config)))
    }

    pub fn with_directory(authority: TokenAuthority, directory: UserDirectory) -> Self {
        Self { authority, directory }
    }

    pub fn issue(&self, identifier: &str) -> Result<String, TokenError> {
        self.authority.issue(identifier)
    }

    pub fn extract_identifier(&self, token: &str) -> Result<String, TokenError> {
        self.authority.extract_identifier(token)
    }

    pub(crate) fn lookup(&self, role: Role) -> Result<&dyn UserLookup, AppError> {
        self.directory
            .lookup(role)
            .map(Arc::as_ref)
            .ok_or_else(|| AppError::Internal(format!("No user lookup registered for role {}", role)))
    }

    /// Resolves the token to the account it names under `role`.
    pub async fn authorize(&self, token: &str, role: Role) -> Result<UserRecord, AppError> {
        let identifier = self
            .extract_identifier(token)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        match self.lookup(role)?.find_by_identifier(&identifier).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::Auth(format!("No {} account matches this token", role))),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// True iff the token verifies and names an existing account of `role`.
    /// Never fails: every error, including unknown roles, is `false`.
    pub async fn validate(&self, token: &str, role: &str) -> bool {
        let role = match role.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                debug!("Token validation refused: {}", e);
                return false;
            }
        };

        match self.authorize(token, role).await {
            Ok(_) => true,
            Err(AppError::Database(e)) => {
                warn!("User lookup failed during token validation: {}", e);
                false
            }
            Err(e) => {
                debug!("Token validation failed for role {}: {}", role, e);
                false
            }
        }
    }
}

/// Handler helper: bearer token from `headers`, checked against `role`.
pub async fn authorize_request(
    config: &AppConfig,
    headers: &HeaderMap,
    role: Role,
) -> Result<UserRecord, AppError> {
    let token = extract_bearer_token(headers)?;
    TokenService::new(config)?.authorize(&token, role).await
}
