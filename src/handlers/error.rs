//! HTTP error mapping. Every failure body is `{"message": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ConcordanceError;

pub const BOTH_PARAMETERS: &str = "If conceptId is present then authority is not a valid parameter";
pub const NO_PARAMETERS: &str = "If conceptId is absent then authority is mandatory";
pub const MULTIPLE_AUTHORITIES: &str = "Multiple authorities are not permitted";
pub const MISSING_IDENTIFIER_VALUE: &str =
    "If authority is present then identifierValue is mandatory";
pub const NOT_FOUND: &str = "Concordance not found.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request, rejected before resolution.
    #[error("{0}")]
    Validation(String),

    #[error("Concordance not found.")]
    NotFound,

    #[error(transparent)]
    Resolution(#[from] ConcordanceError),
}

impl ApiError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Resolution(e) => {
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if let Self::Resolution(e) = &self {
            tracing::error!(
                error = %e,
                retryable = e.is_retryable(),
                "Concordance resolution failed"
            );
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn statuses() {
        assert_eq!(
            ApiError::Validation(NO_PARAMETERS.into()).http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.http_status(), StatusCode::NOT_FOUND);
        let store: ApiError = ConcordanceError::from(StoreError::Unavailable("down".into())).into();
        assert_eq!(store.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_pass_through() {
        assert_eq!(ApiError::NotFound.to_string(), "Concordance not found.");
        assert_eq!(
            ApiError::Validation(MULTIPLE_AUTHORITIES.into()).to_string(),
            MULTIPLE_AUTHORITIES
        );
    }
}
