use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("embedded payload in {field} is not valid JSON: {source}")]
    EmbeddedJson {
        field: &'static str,
        source: serde_json::Error,
    },
    #[error("unparseable timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
