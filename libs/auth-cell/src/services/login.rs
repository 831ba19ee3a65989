use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, LoginResponse, Role};
use shared_models::error::AppError;
use shared_utils::password::verify_password;

use crate::services::token::TokenService;

pub struct LoginService {
    tokens: TokenService,
}

impl LoginService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self::with_tokens(TokenService::new(config)?))
    }

    pub fn with_tokens(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Checks credentials for `role` and issues a token for the identifier.
    pub async fn login(&self, role: Role, request: LoginRequest) -> Result<LoginResponse, AppError> {
        debug!("Login attempt for role {}", role);

        let user = self
            .tokens
            .lookup(role)?
            .find_by_identifier(&request.identifier)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(invalid_credentials)?;

        let matches = verify_password(&request.password, &user.password_hash).unwrap_or_else(|e| {
            warn!("Stored password for {} user {} is not a valid hash: {}", role, user.id, e);
            false
        });

        if !matches {
            return Err(invalid_credentials());
        }

        let token = self
            .tokens
            .issue(&user.identifier)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(LoginResponse { token, role })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Auth("Invalid credentials".to_string())
}
