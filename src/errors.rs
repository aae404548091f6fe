use crate::assets::AssetError;
use crate::form::FieldError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PulseError {
    #[error("Serialization error: {0}")]
    #[diagnostic(code(propertypulse::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(propertypulse::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("User ID is required")]
    #[diagnostic(
        code(propertypulse::unauthorized),
        help("Sign in before submitting or removing a listing")
    )]
    Unauthorized,

    #[error("Property {0} belongs to another user")]
    #[diagnostic(code(propertypulse::forbidden))]
    Forbidden(String),

    #[error("Property not found: {0}")]
    #[diagnostic(code(propertypulse::not_found))]
    NotFound(String),

    #[error("Invalid submission: {}", summarize(.0))]
    #[diagnostic(code(propertypulse::validation))]
    Validation(Vec<FieldError>),

    #[error("Asset upload failed: {0}")]
    #[diagnostic(code(propertypulse::asset))]
    Asset(#[from] AssetError),

    #[error("Bad request: {0}")]
    #[diagnostic(code(propertypulse::bad_request))]
    BadRequest(String),

    #[error("{0}")]
    #[diagnostic(code(propertypulse::other))]
    Other(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PulseError {
    fn status(&self) -> StatusCode {
        match self {
            PulseError::Unauthorized => StatusCode::UNAUTHORIZED,
            PulseError::Forbidden(_) => StatusCode::FORBIDDEN,
            PulseError::NotFound(_) => StatusCode::NOT_FOUND,
            PulseError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PulseError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PulseError::Asset(AssetError::Cancelled) => StatusCode::REQUEST_TIMEOUT,
            PulseError::Asset(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            PulseError::Unauthorized => "unauthorized",
            PulseError::Forbidden(_) => "forbidden",
            PulseError::NotFound(_) => "not_found",
            PulseError::Validation(_) => "invalid_submission",
            PulseError::BadRequest(_) => "bad_request",
            PulseError::Asset(_) => "asset_upload_failed",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for PulseError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let mut body = json!({
            "error": self.code(),
            "error_description": self.to_string(),
        });
        if let PulseError::Validation(fields) = &self {
            body["fields"] = json!(fields);
        }
        (status, Json(body)).into_response()
    }
}
