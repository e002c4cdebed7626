//! Errors surfaced by the web layer.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::downloader::ExportError;
use crate::row::RowError;
use crate::table::TableError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Form or JSON input did not describe a valid row
    #[error(transparent)]
    Validation(#[from] RowError),

    /// Operation not possible in the table's current state
    #[error(transparent)]
    Table(#[from] TableError),

    /// Request body was not usable JSON
    #[error("{}", .0.body_text())]
    Json(#[from] JsonRejection),

    /// Request body was not a usable form submission
    #[error("invalid form submission: {0}")]
    Form(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("page rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Table(_) => StatusCode::CONFLICT,
            AppError::Json(rejection) => rejection.status(),
            AppError::Form(_) => StatusCode::BAD_REQUEST,
            AppError::Export(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        let body = ErrorResponse {
            status: "error",
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
