use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::render;
use crate::{auth::AuthError, data::DataError, session::SessionError, status::TransitionError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(&'static str),

    #[error("Sign in required")]
    Unauthenticated,

    #[error("Not a recognized coordinator")]
    NotCoordinator,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("There is nothing to undo for this change")]
    StaleUndo,

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("Spreadsheet error: {0}")]
    Data(#[from] DataError),

    #[error("Sign-in error: {0}")]
    Auth(#[from] AuthError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotCoordinator => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StaleUndo | AppError::Transition(_) => StatusCode::CONFLICT,
            AppError::Data(_) | AppError::Auth(_) => StatusCode::BAD_GATEWAY,
            AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }

        (status, Html(render::failure_page(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[tokio::test]
    async fn errors_render_as_pages_with_a_way_back() {
        let response = AppError::from(TransitionError::NotEligible {
            name: "יוסי לוי".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("יוסי לוי has not completed an opening call"));
        assert!(html.contains("<a href=\"/\">"));
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(AppError::MalformedPayload("teacherIndex").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotCoordinator.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::StaleUndo.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(TransitionError::NotAssigned { name: "דנה".to_string() }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(DataError::Store(StoreError::UnknownSheet("x".to_string()))).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
