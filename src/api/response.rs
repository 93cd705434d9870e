//! Standard API response types

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Response for single data item
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201` with the body wrapped as `{ "data": ... }`
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, DataResponse::new(self.0)).into_response()
    }
}

/// Helper for no content responses
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// A markdown document served as a download.
pub struct MarkdownAttachment {
    pub filename: String,
    pub content: String,
}

impl MarkdownAttachment {
    /// `filename` carries an ASCII fallback, `filename*` the exact UTF-8 name.
    fn disposition(&self) -> String {
        let fallback: String = self
            .filename
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_ascii_graphic() || c == ' ' => c,
                _ => '_',
            })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(&self.filename)
        )
    }
}

impl IntoResponse for MarkdownAttachment {
    fn into_response(self) -> Response {
        let disposition = self.disposition();
        (
            [
                (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.content,
        )
            .into_response()
    }
}
