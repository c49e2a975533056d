/*!
 * rmbridge - legacy job client delegate for a cluster resource manager
 *
 * Lets a job client written against the old job tracker protocol run on a
 * resource manager:
 * - Application id allocation through caller-owned submission sessions
 * - Exactly-once submission and cancellable coordinator polling
 * - Flattened views of the hierarchical queue tree
 * - Legacy job, tracker and slot-metrics projections
 * - Staging and system directory resolution
 */

pub mod cli_style;
pub mod config;
pub mod convert;
pub mod delegate;
pub mod error;
pub mod legacy;
pub mod logging;
pub mod poll;
pub mod queues;
pub mod staging;

// Re-export commonly used types
pub use config::{BridgeConfig, LogLevel};
pub use delegate::{ResourceDelegate, SubmissionSession, ROOT_QUEUE};
pub use error::{BridgeError, Result};
pub use legacy::{
    DelegationToken, JobId, JobPriority, JobState, JobStatus, LegacyClusterMetrics,
    LegacyQueueInfo, LegacyQueueState, TaskTrackerInfo,
};
pub use poll::PollPolicy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
