use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("HTTP error! status: {status} - {body}")]
    ServerError { status: u16, body: String },

    /// A 2xx reply whose body did not match the expected shape.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Run not found: {0}")]
    NotFound(String),

    #[error("A load test is already running")]
    AlreadyRunning,
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConsoleError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            ConsoleError::ServerError {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            ConsoleError::NetworkFailure(e.to_string())
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConsoleError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::ServerError { .. } => StatusCode::BAD_GATEWAY,
            ConsoleError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsoleError::AlreadyRunning => StatusCode::CONFLICT,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
