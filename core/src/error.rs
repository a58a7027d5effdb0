use thiserror::Error;

/// Fatal modem failures.
///
/// Channel rejections and discarded frames are deliberately absent: both
/// are normal outcomes of a best-effort acoustic link and are reported
/// through [`crate::SendOutcome`] and the decoder's discard counter
/// instead of the error path.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
