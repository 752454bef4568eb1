use thiserror::Error;

use super::encode::EncodeError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("reason list unavailable: {message}")]
    Reasons { message: String },
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn reasons(message: impl Into<String>) -> Self {
        Self::Reasons {
            message: message.into(),
        }
    }
}
