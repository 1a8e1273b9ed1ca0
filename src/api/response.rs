use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Plain-text error response; the message is passed through unfiltered.
pub fn error(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}
