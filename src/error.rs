/*!
 * Error types for rmbridge
 */

use rmbridge_connect::ConnectError;
use rmbridge_interface::{ApplicationId, ProtocolError};
use std::fmt;
use std::io;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum BridgeError {
    /// Missing or unusable configuration (address, staging dir, config file)
    Configuration(String),

    /// RPC layer failure; never retried by the delegate
    Transport(String),

    /// The resource manager refused the submission
    Submission(String),

    /// The named queue does not exist at the resource manager
    QueueNotFound(String),

    /// Legacy operation with no resource manager equivalent
    Unsupported(&'static str),

    /// Caller broke the protocol's calling contract
    Precondition(String),

    /// Polling was cancelled by the caller
    Cancelled { application_id: ApplicationId },

    /// Polling gave up after the configured deadline
    DeadlineExceeded {
        application_id: ApplicationId,
        waited: Duration,
    },

    /// Any other refusal from the resource manager
    Remote(String),

    /// The resource manager answered with data the delegate cannot use
    InvalidResponse(String),

    /// Local filesystem error (staging and system directories)
    Io(io::Error),
}

impl BridgeError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            EXIT_FATAL
        } else {
            EXIT_PARTIAL
        }
    }

    /// Check if this error is fatal (caller should not retry the same call)
    pub fn is_fatal(&self) -> bool {
        match self {
            BridgeError::Configuration(_) => true,
            BridgeError::Transport(_) => true,
            BridgeError::Unsupported(_) => true,
            BridgeError::Precondition(_) => true,
            BridgeError::InvalidResponse(_) => true,

            BridgeError::Submission(_) => false,
            BridgeError::QueueNotFound(_) => false,
            BridgeError::Cancelled { .. } => false,
            BridgeError::DeadlineExceeded { .. } => false,
            BridgeError::Remote(_) => false,
            BridgeError::Io(_) => false,
        }
    }

    /// Check if this error is an unsupported legacy operation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, BridgeError::Unsupported(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::Configuration(_) => ErrorCategory::Configuration,
            BridgeError::Transport(_) => ErrorCategory::Network,
            BridgeError::Submission(_) | BridgeError::Remote(_) => ErrorCategory::Remote,
            BridgeError::QueueNotFound(_) => ErrorCategory::Validation,
            BridgeError::Unsupported(_) => ErrorCategory::Compatibility,
            BridgeError::Precondition(_) => ErrorCategory::Validation,
            BridgeError::Cancelled { .. } | BridgeError::DeadlineExceeded { .. } => {
                ErrorCategory::Lifecycle
            }
            BridgeError::InvalidResponse(_) => ErrorCategory::Protocol,
            BridgeError::Io(_) => ErrorCategory::IoError,
        }
    }

    /// Remote failures of a submission call surface as submission errors;
    /// transport failures keep their own kind.
    pub(crate) fn from_submission(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Rejected { message, .. } => BridgeError::Submission(message),
            ProtocolError::ApplicationNotFound(id) => {
                BridgeError::Submission(format!("Application {} unknown to the resource manager", id))
            }
            other => other.into(),
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller input or queue names
    Validation,
    /// Configuration errors
    Configuration,
    /// Network/transport errors
    Network,
    /// The resource manager refused a call
    Remote,
    /// Malformed responses
    Protocol,
    /// Legacy operations without an equivalent
    Compatibility,
    /// Poll cancellation and deadlines
    Lifecycle,
    /// Local I/O
    IoError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Remote => write!(f, "remote"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Compatibility => write!(f, "compatibility"),
            ErrorCategory::Lifecycle => write!(f, "lifecycle"),
            ErrorCategory::IoError => write!(f, "io"),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Configuration(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            BridgeError::Transport(msg) => {
                write!(f, "Transport error: {}", msg)
            }
            BridgeError::Submission(msg) => {
                write!(f, "Submission rejected: {}", msg)
            }
            BridgeError::QueueNotFound(name) => {
                write!(f, "Queue not found: {}", name)
            }
            BridgeError::Unsupported(operation) => {
                write!(f, "Operation not supported by the resource manager: {}", operation)
            }
            BridgeError::Precondition(msg) => {
                write!(f, "Precondition failed: {}", msg)
            }
            BridgeError::Cancelled { application_id } => {
                write!(f, "Cancelled while waiting for {}", application_id)
            }
            BridgeError::DeadlineExceeded {
                application_id,
                waited,
            } => {
                write!(
                    f,
                    "Application master of {} not ready after {:?}",
                    application_id, waited
                )
            }
            BridgeError::Remote(msg) => {
                write!(f, "Resource manager error: {}", msg)
            }
            BridgeError::InvalidResponse(msg) => {
                write!(f, "Invalid response: {}", msg)
            }
            BridgeError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BridgeError {
    fn from(err: io::Error) -> Self {
        BridgeError::Io(err)
    }
}

impl From<ProtocolError> for BridgeError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Transport(msg) => BridgeError::Transport(msg),
            ProtocolError::QueueNotFound(name) => BridgeError::QueueNotFound(name),
            ProtocolError::ApplicationNotFound(id) => {
                BridgeError::Remote(format!("Application {} not found", id))
            }
            ProtocolError::Rejected { operation, message } => {
                BridgeError::Remote(format!("{}: {}", operation, message))
            }
            ProtocolError::InvalidResponse(msg) => BridgeError::InvalidResponse(msg),
        }
    }
}

impl From<ConnectError> for BridgeError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Configuration(msg) => BridgeError::Configuration(msg),
            ConnectError::Transport(e) => BridgeError::Transport(e.to_string()),
        }
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Configuration(format!("TOML parse error: {}", err))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Configuration(format!("JSON parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(BridgeError::Configuration("no address".to_string()).is_fatal());
        assert!(BridgeError::Transport("reset".to_string()).is_fatal());
        assert!(BridgeError::Unsupported("getBlacklistedTrackers").is_fatal());
        assert_eq!(
            BridgeError::Transport("reset".to_string()).exit_code(),
            EXIT_FATAL
        );
    }

    #[test]
    fn test_non_fatal_errors() {
        assert!(!BridgeError::Submission("queue full".to_string()).is_fatal());
        assert!(!BridgeError::QueueNotFound("etl".to_string()).is_fatal());
        assert_eq!(
            BridgeError::Remote("busy".to_string()).exit_code(),
            EXIT_PARTIAL
        );
    }

    #[test]
    fn test_protocol_error_mapping() {
        let err: BridgeError = ProtocolError::Transport("refused".to_string()).into();
        assert!(matches!(err, BridgeError::Transport(_)));

        let err: BridgeError = ProtocolError::QueueNotFound("etl".to_string()).into();
        assert!(matches!(err, BridgeError::QueueNotFound(ref q) if q == "etl"));

        let err: BridgeError = ProtocolError::rejected("get_queue_info", "denied").into();
        assert_eq!(
            err.to_string(),
            "Resource manager error: get_queue_info: denied"
        );
    }

    #[test]
    fn test_submission_mapping_keeps_transport() {
        let err = BridgeError::from_submission(ProtocolError::rejected(
            "submit_application",
            "queue stopped",
        ));
        assert_eq!(err.to_string(), "Submission rejected: queue stopped");

        let err = BridgeError::from_submission(ProtocolError::Transport("reset".to_string()));
        assert!(matches!(err, BridgeError::Transport(_)));
    }

    #[test]
    fn test_unsupported_display() {
        let err = BridgeError::Unsupported("renewDelegationToken");
        assert!(err.is_unsupported());
        assert_eq!(err.category(), ErrorCategory::Compatibility);
        assert_eq!(
            err.to_string(),
            "Operation not supported by the resource manager: renewDelegationToken"
        );
    }
}
