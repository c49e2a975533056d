//! rmbridge Interface: the resource manager as seen by the delegate
//!
//! This crate defines the `ResourceManagerProtocol` trait, which abstracts the
//! client-facing RPC surface of a cluster resource manager (RM), together with
//! the record types that travel across it.
//!
//! # Architecture
//!
//! The trait covers three groups of operations:
//!
//! 1. **Application lifecycle**: allocate an id, submit, query the coordinator
//! 2. **Cluster inspection**: applications, nodes, aggregate metrics
//! 3. **Queue hierarchy**: fetch a queue node with an optional subtree
//!
//! Implementations:
//! - `RemoteResourceManager` (in `rmbridge-connect`): gRPC client
//! - `testing::ScriptedResourceManager` (feature `testing`): in-memory fake
//!   with scripted answers
//!
//! # Example
//!
//! ```rust,no_run
//! use rmbridge_interface::{ResourceManagerProtocol, QueueInfoRequest};
//!
//! async fn count_queues<R: ResourceManagerProtocol>(rm: &R) -> anyhow::Result<usize> {
//!     let root = rm
//!         .get_queue_info(&QueueInfoRequest::new("root").with_children(true).recursive(true))
//!         .await?;
//!     Ok(root.child_queues.len())
//! }
//! ```

mod records;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use records::{
    ApplicationId, ApplicationMaster, ApplicationReport, ApplicationState,
    ApplicationSubmissionContext, ClusterMetrics, NodeHealth, NodeId, NodeReport, QueueInfo,
    QueueInfoRequest, QueueState, Resource,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The RPC layer could not deliver the call (connection refused, reset,
    /// deadline exceeded). Never retried by the delegate.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The named queue does not exist at the resource manager
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// The resource manager has no record of the application
    #[error("Application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    /// The resource manager understood the call and refused it
    #[error("Resource manager rejected {operation}: {message}")]
    Rejected { operation: String, message: String },

    /// The response could not be mapped onto the record model
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProtocolError {
    /// Build a rejection for the given operation name
    pub fn rejected(operation: &str, message: impl Into<String>) -> Self {
        ProtocolError::Rejected {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error comes from the transport rather than the service
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Client protocol of the cluster resource manager
///
/// Every method is exactly one remote call. Implementations must not retry
/// internally: `submit_application` in particular is not idempotent at the
/// service, and the poll loop above this trait decides what to retry.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so the delegate can hold
/// them behind an `Arc<dyn ResourceManagerProtocol>`.
#[async_trait]
pub trait ResourceManagerProtocol: Send + Sync + 'static {
    // ═══════════════════════════════════════════════════════════════════════
    // 1. Application Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Allocate a fresh, cluster-unique application id
    async fn get_new_application_id(&self) -> Result<ApplicationId>;

    /// Submit a fully described application
    ///
    /// The context must already carry the id obtained from
    /// [`get_new_application_id`](Self::get_new_application_id).
    async fn submit_application(&self, context: &ApplicationSubmissionContext) -> Result<()>;

    /// Current status of the application's coordinating process
    async fn get_application_master(&self, application_id: &ApplicationId)
        -> Result<ApplicationMaster>;

    // ═══════════════════════════════════════════════════════════════════════
    // 2. Cluster Inspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Every application the resource manager knows about
    async fn get_all_applications(&self) -> Result<Vec<ApplicationReport>>;

    /// Every node manager registered with the cluster
    async fn get_cluster_nodes(&self) -> Result<Vec<NodeReport>>;

    /// Aggregate cluster snapshot
    async fn get_cluster_metrics(&self) -> Result<ClusterMetrics>;

    // ═══════════════════════════════════════════════════════════════════════
    // 3. Queue Hierarchy
    // ═══════════════════════════════════════════════════════════════════════

    /// Fetch one queue, with children populated according to the request
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::QueueNotFound` if the queue does not exist.
    async fn get_queue_info(&self, request: &QueueInfoRequest) -> Result<QueueInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_constructor() {
        let err = ProtocolError::rejected("submit_application", "queue is stopped");
        assert_eq!(
            err.to_string(),
            "Resource manager rejected submit_application: queue is stopped"
        );
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_detection() {
        assert!(ProtocolError::Transport("connection reset".to_string()).is_transport());
        assert!(!ProtocolError::QueueNotFound("default".to_string()).is_transport());
    }
}
