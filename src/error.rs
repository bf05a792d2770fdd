use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Position {position} is already taken in {scope} {scope_id}")]
    PositionConflict {
        scope: &'static str,
        scope_id: i32,
        position: i32,
    },

    #[error("Block template {0} not found")]
    TemplateNotFound(i32),

    #[error("Base element {0} not found")]
    ElementNotFound(i32),

    #[error("Zero-block {0} not found")]
    ZeroBlockNotFound(i32),

    #[error("Zero-block responsive {0} not found")]
    ResponsiveNotFound(i32),

    #[error("Zero-block responsive {responsive_id} does not belong to zero-block {zero_block_id}")]
    OwnershipMismatch {
        responsive_id: i32,
        zero_block_id: i32,
    },

    #[error("Layer {layer_id} already has settings for responsive {responsive_id}")]
    DuplicateOverride { layer_id: i32, responsive_id: i32 },

    #[error("Breakpoint with width {width} already exists in zero-block {zero_block_id}")]
    BreakpointConflict { zero_block_id: i32, width: i32 },

    #[error("Zero-block already exists for block {0}")]
    ZeroBlockExists(i32),

    #[error("Block {0} is not of type 'zeroblock'")]
    NotZeroBlockType(i32),

    #[error("Base element with type_name '{0}' already exists")]
    DuplicateTypeName(String),

    #[error("Block template '{0}' already exists")]
    DuplicateTemplateName(String),

    #[error("Page slug '{0}' is already used in this project")]
    DuplicateSlug(String),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Stable machine-readable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::PositionConflict { .. } => "position_conflict",
            ServerError::TemplateNotFound(_) => "template_not_found",
            ServerError::ElementNotFound(_) => "element_not_found",
            ServerError::ZeroBlockNotFound(_) => "zero_block_not_found",
            ServerError::ResponsiveNotFound(_) => "responsive_not_found",
            ServerError::OwnershipMismatch { .. } => "ownership_mismatch",
            ServerError::DuplicateOverride { .. } => "duplicate_override",
            ServerError::BreakpointConflict { .. } => "breakpoint_conflict",
            ServerError::ZeroBlockExists(_) => "zero_block_exists",
            ServerError::NotZeroBlockType(_) => "not_zero_block_type",
            ServerError::DuplicateTypeName(_) => "duplicate_type_name",
            ServerError::DuplicateTemplateName(_) => "duplicate_template_name",
            ServerError::DuplicateSlug(_) => "duplicate_slug",
            ServerError::UsernameTaken(_) => "username_taken",
            ServerError::NotFound(_) => "not_found",
            ServerError::AuthRequired => "unauthenticated",
            ServerError::AuthFailed => "auth_failed",
            ServerError::PermissionDenied => "forbidden",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Config(_) => "config",
            ServerError::Database(_) | ServerError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::TemplateNotFound(_)
            | ServerError::ElementNotFound(_)
            | ServerError::ZeroBlockNotFound(_)
            | ServerError::ResponsiveNotFound(_)
            | ServerError::OwnershipMismatch { .. }
            | ServerError::NotZeroBlockType(_)
            | ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PositionConflict { .. }
            | ServerError::DuplicateOverride { .. }
            | ServerError::BreakpointConflict { .. }
            | ServerError::ZeroBlockExists(_)
            | ServerError::DuplicateTypeName(_)
            | ServerError::DuplicateTemplateName(_)
            | ServerError::DuplicateSlug(_)
            | ServerError::UsernameTaken(_) => StatusCode::CONFLICT,
            ServerError::AuthRequired | ServerError::AuthFailed => StatusCode::UNAUTHORIZED,
            ServerError::PermissionDenied => StatusCode::FORBIDDEN,
            ServerError::Database(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ServerError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = serde_json::json!({
            "detail": detail,
            "kind": self.kind(),
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
