use std::sync::Arc;

use axum::http::{HeaderMap, header};
use common_errors::AppError;
use sql_connection::SqlConnect;
use tag_dao::{PostgresPrincipalStore, PrincipalStore};
use uuid::Uuid;

/// Resolves a bearer token from the Authorization header to a user id.
/// User-scoped endpoints call this before touching any other store.
#[derive(Clone)]
pub struct AuthService {
    principals: Arc<dyn PrincipalStore>,
}

impl AuthService {
    pub fn new(db: SqlConnect) -> Self {
        Self {
            principals: Arc::new(PostgresPrincipalStore::new(db)),
        }
    }

    pub fn with_custom_components(
        principals: Arc<dyn PrincipalStore>,
    ) -> Self {
        Self { principals }
    }

    pub async fn authenticate(
        &self, headers: &HeaderMap,
    ) -> Result<Uuid, AppError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Missing or malformed Authorization header",
                )
            })?;

        match self.principals.resolve_token(token).await {
            Ok(Some(user_id)) => Ok(user_id),
            Ok(None) => {
                Err(AppError::unauthorized("Session is invalid or expired"))
            }
            Err(e) => Err(AppError::from_error(e)),
        }
    }
}
