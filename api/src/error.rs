use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use freelance_desk_db::access::AccessLevel;
use thiserror::Error;

use freelance_desk_http_errors::ErrorResponseData;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database Error: {0}")]
    DbErr(#[from] diesel::result::Error),

    #[error("Database Pool Error: {0}")]
    DbPool(#[from] deadpool_diesel::PoolError),

    #[error("Missing Permission {0}")]
    MissingPermission(AccessLevel),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Auth error: {0}")]
    AuthError(#[from] freelance_desk_auth::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] freelance_desk_storage::Error),

    #[error("Mail error: {0}")]
    MailError(#[from] freelance_desk_mail::Error),

    #[error("Not found")]
    NotFound,

    #[error("Unknown {0}")]
    ObjectNotFound(&'static str),

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("This invitation has expired")]
    ExpiredInvite,

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    AxumError(#[from] axum::Error),

    #[error("Invalid session id")]
    InvalidSessionId,
}

impl Error {
    /// Shorthand for the common malformed-or-missing-field case.
    pub fn invalid(field: &'static str, message: &'static str) -> Self {
        Error::Validation { field, message }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            Error::DbErr(_) => "db",
            Error::DbPool(_) => "db_pool",
            Error::MissingPermission(_) => "authz",
            Error::Unauthenticated => "authn",
            Error::AuthError(_) => "authn",
            Error::StorageError(_) => "storage",
            Error::MailError(_) => "email",
            Error::NotFound => "not_found",
            Error::ObjectNotFound(_) => "not_found",
            Error::Validation { .. } => "validation",
            Error::ExpiredInvite => "expired_invite",
            Error::IoError(_) => "internal_server_error",
            Error::AxumError(_) => "bad_request",
            Error::InvalidSessionId => "authn",
        }
    }

    pub fn response_tuple(&self) -> (StatusCode, ErrorResponseData) {
        let status = match self {
            Error::MissingPermission(_) => StatusCode::FORBIDDEN,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::AuthError(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidSessionId => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::ExpiredInvite => StatusCode::GONE,
            Error::AxumError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let data = ErrorResponseData::new(self.error_kind(), self.to_string());
        let data = match self {
            Error::Validation { field, .. } => data.with_field(*field),
            _ => data,
        };

        (status, data)
    }
}

impl From<deadpool_diesel::InteractError> for Error {
    fn from(e: deadpool_diesel::InteractError) -> Self {
        std::panic::panic_any(e)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (code, json) = self.response_tuple();
        (code, Json(json)).into_response()
    }
}
