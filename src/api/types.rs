//! Request and response bodies that only exist at the HTTP boundary.
//!
//! Bodies consumed directly by a service (`NewBlock`, `NewLayer`, ...) live
//! next to that service.

use serde::{Deserialize, Serialize};

use crate::db::entities::user;
use crate::services::blocks::{BlockPlacement, MAX_PAGE_SIZE};

// ============================================================================
// Request Types
// ============================================================================

/// POST /api/auth/register and /api/auth/login body
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

fn default_limit() -> u64 {
    MAX_PAGE_SIZE
}

/// Query params for block listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// PATCH /api/blocks/:id body
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub settings: serde_json::Value,
}

/// PATCH .../position body
#[derive(Debug, Deserialize)]
pub struct PositionUpdate {
    pub position: i32,
}

/// PUT /api/pages/:id/blocks/order body
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub blocks: Vec<BlockPlacement>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub created_at: i64,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.skip, 0);
        assert_eq!(query.limit, 100);
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = user::Model {
            id: 1,
            username: "alice".to_string(),
            password_hash: "salt$digest".to_string(),
            is_admin: false,
            created_at: 0,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
