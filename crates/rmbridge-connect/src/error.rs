//! Error types for the rmbridge-connect crate

use rmbridge_interface::ProtocolError;
use thiserror::Error;
use tonic::{Code, Status};

/// Failure to establish the connection to the resource manager
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Address, endpoint or credential settings are unusable
    #[error("Invalid resource manager configuration: {0}")]
    Configuration(String),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<tonic::metadata::errors::InvalidMetadataValue> for ConnectError {
    fn from(err: tonic::metadata::errors::InvalidMetadataValue) -> Self {
        ConnectError::Configuration(format!("Invalid auth token: {}", err))
    }
}

/// Whether a status reports a delivery failure rather than a service answer
pub(crate) fn is_transport_status(status: &Status) -> bool {
    matches!(
        status.code(),
        Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled
    )
}

/// Map a failed call of `operation` onto the protocol error taxonomy
///
/// Callers handle `NOT_FOUND` themselves where it has a specific meaning.
pub(crate) fn status_error(operation: &str, status: Status) -> ProtocolError {
    if is_transport_status(&status) {
        ProtocolError::Transport(format!("{}: {}", operation, status.message()))
    } else {
        ProtocolError::rejected(operation, format!("{:?}: {}", status.code(), status.message()))
    }
}
