use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::db;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Submitted form data was rejected; the form is shown again with the message
    #[error("{message}")]
    Validation { message: String },

    /// Username/password pair did not match a stored user
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Requested resource does not exist
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: i32 },

    /// Path segment that cannot name any resource
    #[error("Page not found")]
    PageNotFound,

    /// Generic internal failure, e.g. hashing or token signing
    #[error("Failed to {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Database(#[from] db::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound { .. } | Error::PageNotFound => StatusCode::NOT_FOUND,
            Error::Database(db::Error::UniqueViolation(_)) => StatusCode::CONFLICT,
            Error::Database(db::Error::ForeignKeyViolation(_)) => StatusCode::BAD_REQUEST,
            Error::Internal { .. } | Error::Database(_) | Error::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the client
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { .. }
            | Error::InvalidCredentials
            | Error::NotFound { .. }
            | Error::PageNotFound => self.to_string(),
            Error::Database(db::Error::UniqueViolation(_)) => "Resource already exists".to_owned(),
            Error::Database(db::Error::ForeignKeyViolation(_)) => {
                "Invalid reference to related resource".to_owned()
            }
            Error::Internal { .. } | Error::Database(_) | Error::Template(_) => {
                "Internal server error".to_owned()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Internal service error: {:#}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        (status, self.user_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_do_not_leak_details() {
        let err = Error::Database(db::Error::Database(sea_orm::DbErr::Custom(
            "disk I/O error at /var/lib/menuboard.sqlite".to_owned(),
        )));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn not_found_names_the_resource() {
        let err = Error::NotFound {
            resource: "Dish",
            id: 7,
        };

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Dish with ID 7 not found");
    }

    #[test]
    fn bad_credentials_are_generic() {
        assert_eq!(
            Error::InvalidCredentials.user_message(),
            "Invalid username or password"
        );
    }
}
