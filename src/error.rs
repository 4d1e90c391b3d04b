use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// typed error kinds surfaced by the core (spec §7). The handler layer maps
/// each to an HTTP status via [`Error::status_code`]; the core itself never
/// renders user-visible text.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state transition: {0}")]
    State(String),

    #[error("model not ready: {0}")]
    ModelNotReady(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("transient external failure: {0}")]
    TransientExternal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
    pub fn state(msg: impl Into<String>) -> Self {
        Error::State(msg.into())
    }
    pub fn model_not_ready(msg: impl Into<String>) -> Self {
        Error::ModelNotReady(msg.into())
    }
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }
    pub fn transient(msg: impl Into<String>) -> Self {
        Error::TransientExternal(msg.into())
    }

    /// HTTP status code this error kind maps onto (spec §7).
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::State(_) => 400,
            Error::ModelNotReady(_) => 503,
            Error::Schema(_) => 500,
            Error::TransientExternal(_) => 503,
        }
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for Error {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(Error::status_code(self))
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self))
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}
