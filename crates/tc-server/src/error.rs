//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tc_site::ContentError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// No site is served on the requested host.
    #[error("Unknown site: {0}")]
    UnknownSite(String),

    /// Content lookup or controller error.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownSite(_) => StatusCode::NOT_FOUND,
            Self::Content(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Content(ContentError::UnknownSite(_)) => StatusCode::NOT_FOUND,
            Self::Content(ContentError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Self::Content(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, axum::Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ServerError::from(ContentError::NotFound {
            kind: "Page",
            key: "about".to_owned(),
        });
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = ServerError::from(ContentError::Validation {
            field: "slug",
            message: "bad".to_owned(),
        });
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let controller = ServerError::from(ContentError::UnknownController("x".to_owned()));
        assert_eq!(
            controller.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let site = ServerError::UnknownSite("nope.example".to_owned());
        assert_eq!(site.into_response().status(), StatusCode::NOT_FOUND);
    }
}
