//! Authentication: user accounts, bearer tokens and request extractors.
//!
//! Passwords are stored as `salt$sha256(salt:password)`. Bearer tokens are
//! random, returned once at login, and persisted only as their SHA-256 hash
//! with an expiry. Basic credentials are also accepted on every request.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};

use super::AppState;
use crate::db::entities::{access_token, user, AccessToken, User};
use crate::db::unix_now;
use crate::error::{Result, ServerError};

const TOKEN_PREFIX: &str = "zb_";

fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Hash a password with a fresh random salt
fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let digest = sha256_hex(&[salt.as_bytes(), b":", password.as_bytes()]);
    format!("{}${}", salt, digest)
}

fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => {
            sha256_hex(&[salt.as_bytes(), b":", password.as_bytes()]) == digest
        }
        None => false,
    }
}

/// Generate an opaque bearer token
fn generate_token() -> String {
    let a = uuid::Uuid::new_v4();
    let b = uuid::Uuid::new_v4();
    format!("{}{}{}", TOKEN_PREFIX, a.simple(), b.simple())
}

fn hash_token(token: &str) -> String {
    sha256_hex(&[token.as_bytes()])
}

/// A freshly issued token. The raw value is never stored.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub user: user::Model,
    pub expires_at: i64,
}

/// Authentication manager
pub struct AuthManager {
    db: Arc<DatabaseConnection>,
    token_ttl: Duration,
}

impl AuthManager {
    pub fn new(db: Arc<DatabaseConnection>, token_ttl: Duration) -> Self {
        Self { db, token_ttl }
    }

    /// Create a regular user account
    pub async fn register_user(&self, username: &str, password: &str) -> Result<user::Model> {
        if username.len() < 2 || username.len() > 50 {
            return Err(ServerError::InvalidRequest(
                "Username must be 2-50 characters".to_string(),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ServerError::InvalidRequest(
                "Username can only contain letters, numbers, dashes, and underscores".to_string(),
            ));
        }
        if password.len() < 4 {
            return Err(ServerError::InvalidRequest(
                "Password must be at least 4 characters".to_string(),
            ));
        }

        self.insert_user(username, password, false).await
    }

    async fn insert_user(&self, username: &str, password: &str, is_admin: bool) -> Result<user::Model> {
        if self.get_user_by_username(username).await?.is_some() {
            return Err(ServerError::UsernameTaken(username.to_string()));
        }

        let user = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)),
            is_admin: Set(is_admin),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        tracing::info!("Registered user {} (admin: {})", user.username, is_admin);
        Ok(user)
    }

    /// Make sure the bootstrap admin exists and is an admin
    pub async fn ensure_admin_user(&self, username: &str, password: &str) -> Result<user::Model> {
        match self.get_user_by_username(username).await? {
            Some(existing) if existing.is_admin => Ok(existing),
            Some(existing) => {
                let mut active: user::ActiveModel = existing.into();
                active.is_admin = Set(true);
                let promoted = active.update(self.db.as_ref()).await?;
                tracing::warn!("Promoted existing user {} to admin", promoted.username);
                Ok(promoted)
            }
            None => self.insert_user(username, password, true).await,
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> Result<user::Model> {
        let user = self
            .get_user_by_username(username)
            .await?
            .ok_or(ServerError::AuthFailed)?;

        if !verify_password(password, &user.password_hash) {
            tracing::debug!("Password mismatch for {}", username);
            return Err(ServerError::AuthFailed);
        }
        Ok(user)
    }

    /// Authenticate with username/password, returns a new token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let user = self.verify_credentials(username, password).await?;

        self.cleanup_expired_tokens().await?;

        let token = generate_token();
        let now = unix_now();
        let expires_at = i64::try_from(self.token_ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .unwrap_or(i64::MAX);
        access_token::ActiveModel {
            user_id: Set(user.id),
            token_hash: Set(hash_token(&token)),
            created_at: Set(now),
            expires_at: Set(expires_at),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(IssuedToken {
            token,
            user,
            expires_at,
        })
    }

    /// Validate a raw token and return its user
    pub async fn validate_token(&self, token: &str) -> Result<user::Model> {
        let found = AccessToken::find()
            .filter(access_token::Column::TokenHash.eq(hash_token(token)))
            .find_also_related(User)
            .one(self.db.as_ref())
            .await?;

        match found {
            Some((stored, Some(user))) if stored.expires_at > unix_now() => Ok(user),
            _ => Err(ServerError::AuthFailed),
        }
    }

    /// Parse a Bearer header and validate it, returning the user and raw token
    pub async fn validate_bearer(&self, auth_header: &str) -> Result<(user::Model, String)> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ServerError::AuthFailed)?;
        let user = self.validate_token(token).await?;
        Ok((user, token.to_string()))
    }

    /// Parse Basic auth header and check the credentials
    pub async fn authenticate_basic(&self, auth_header: &str) -> Result<user::Model> {
        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or(ServerError::AuthFailed)?;
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|_| ServerError::AuthFailed)?;
        let credentials = String::from_utf8(decoded).map_err(|_| ServerError::AuthFailed)?;
        let (username, password) = credentials
            .split_once(':')
            .ok_or(ServerError::AuthFailed)?;

        self.verify_credentials(username, password).await
    }

    /// Resolve an `Authorization` header value to a user. The raw token is
    /// returned for Bearer headers so it can be revoked later.
    pub async fn resolve_header(&self, auth_header: &str) -> Result<(user::Model, Option<String>)> {
        if auth_header.starts_with("Basic ") {
            let user = self.authenticate_basic(auth_header).await?;
            return Ok((user, None));
        }
        let (user, token) = self.validate_bearer(auth_header).await?;
        Ok((user, Some(token)))
    }

    /// Revoke a token
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        AccessToken::delete_many()
            .filter(access_token::Column::TokenHash.eq(hash_token(token)))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Cleanup expired tokens
    pub async fn cleanup_expired_tokens(&self) -> Result<u64> {
        let result = AccessToken::delete_many()
            .filter(access_token::Column::ExpiresAt.lte(unix_now()))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected > 0 {
            tracing::debug!("Removed {} expired tokens", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}

/// The authenticated caller
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: user::Model,
    /// Present when the caller authenticated with a bearer token
    pub token: Option<String>,
}

/// The authenticated caller, required to be an admin
#[derive(Clone, Debug)]
pub struct AdminUser(pub user::Model);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ServerError::AuthRequired)?;

        let (user, token) = state.auth.resolve_header(header).await?;
        Ok(CurrentUser { user, token })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.is_admin {
            return Err(ServerError::PermissionDenied);
        }
        Ok(AdminUser(current.user))
    }
}
