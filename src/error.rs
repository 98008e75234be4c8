use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    #[error("Access denied.")]
    AccessDenied,

    #[error("File or directory not found: {0}")]
    NotFound(String),

    #[error("File operation not allowed on directory")]
    NotAFile,

    #[error("Specified directory does not exist or is not a directory.")]
    InvalidRoot(String),

    #[error("Directory path required.")]
    MissingRoot,

    #[error("Bad upload: {0}")]
    BadUpload(String),

    #[error("Upload too large: more than {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::MalformedPath(_) => StatusCode::NOT_FOUND,
            ServeError::AccessDenied => StatusCode::FORBIDDEN,
            ServeError::NotFound(_) => StatusCode::NOT_FOUND,
            ServeError::NotAFile => StatusCode::BAD_REQUEST,
            ServeError::InvalidRoot(_) => StatusCode::NOT_FOUND,
            ServeError::MissingRoot => StatusCode::BAD_REQUEST,
            ServeError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ServeError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();

        // OS error text can name host paths; keep it in the log only.
        let body = match &self {
            ServeError::Io(err) => {
                error!("I/O failure while handling request: {}", err);
                "Internal I/O error.".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
