use sessionstitch_telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StitchError {
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("effect window holds {count} base URIs, expected exactly one")]
    CorruptEffectWindow { count: usize },
    #[error("listener failed: {0}")]
    Listener(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type StitchResult<T> = Result<T, StitchError>;
