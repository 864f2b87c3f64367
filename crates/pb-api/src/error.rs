//! The error boundary: any failure that escapes a handler is answered with
//! the full-screen failure page instead of a bare status line.

use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use pb_core::{AppError, Language};
use pb_ui::ErrorTemplate;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{source}")]
pub struct ApiError {
    #[source]
    pub source: AppError,
    pub lang: Language,
}

impl ApiError {
    pub fn new(source: AppError, lang: Language) -> Self {
        Self { source, lang }
    }
}

impl From<AppError> for ApiError {
    fn from(source: AppError) -> Self {
        Self::new(source, Language::default())
    }
}

impl ApiError {
    /// A template failed to render.
    pub fn render(e: askama::Error, lang: Language) -> Self {
        Self::new(AppError::Internal(format!("render failed: {e}")), lang)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.source {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_, _) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::RemoteWrite(_) | AppError::RemoteRead(_) | AppError::GenerativeService(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.source, "request failed");
        } else {
            tracing::debug!(error = %self.source, "request rejected");
        }

        let body = ErrorTemplate::new(self.lang, self.source.to_string())
            .render()
            .unwrap_or_else(|_| format!("<h1>{status}</h1><button onclick=\"location.reload()\">Reload</button>"));
        HttpResponse::build(status).content_type(ContentType::html()).body(body)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
