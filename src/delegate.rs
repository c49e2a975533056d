/*!
 * ResourceDelegate: legacy job-client calls on top of the resource manager
 */

use rmbridge_interface::{
    ApplicationId, ApplicationMaster, ApplicationSubmissionContext, QueueInfoRequest,
    ResourceManagerProtocol,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::convert;
use crate::error::{BridgeError, Result};
use crate::legacy::{
    DelegationToken, JobId, JobPriority, JobStatus, LegacyClusterMetrics, LegacyQueueInfo,
    TaskTrackerInfo,
};
use crate::poll::{self, PollPolicy};
use crate::queues;
use crate::staging::StagingArea;

/// Name of the top of the queue hierarchy
pub const ROOT_QUEUE: &str = "root";

/// One allocated application id on its way to submission
///
/// Only [`ResourceDelegate::new_job_id`] creates sessions, and
/// [`ResourceDelegate::submit_application`] consumes them, so an id can be
/// submitted at most once and never without having been allocated.
///
/// A session cannot be built by hand:
///
/// ```compile_fail
/// use rmbridge::SubmissionSession;
/// use rmbridge_interface::ApplicationId;
///
/// let session = SubmissionSession {
///     application_id: ApplicationId::new(1_315_895_242_400, 1),
/// };
/// ```
///
/// and a submitted session cannot be submitted again:
///
/// ```compile_fail
/// # use rmbridge::ResourceDelegate;
/// # use rmbridge_interface::ApplicationSubmissionContext;
/// # async fn twice(delegate: ResourceDelegate) -> rmbridge::error::Result<()> {
/// let session = delegate.new_job_id().await?;
/// delegate
///     .submit_application(session, ApplicationSubmissionContext::new("first"))
///     .await?;
/// delegate
///     .submit_application(session, ApplicationSubmissionContext::new("again"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct SubmissionSession {
    application_id: ApplicationId,
}

impl SubmissionSession {
    pub fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// The allocated id in legacy form
    pub fn job_id(&self) -> JobId {
        convert::job_id(&self.application_id)
    }
}

/// Client-side adapter from the legacy job protocol to the resource manager
///
/// Holds the single protocol client for its whole lifetime. Per-submission
/// state lives in [`SubmissionSession`], so one delegate can be shared by
/// concurrent callers.
#[derive(Clone)]
pub struct ResourceDelegate {
    rm: Arc<dyn ResourceManagerProtocol>,
    staging: StagingArea,
    poll_policy: PollPolicy,
}

impl ResourceDelegate {
    /// Validate `config` and connect to the configured resource manager
    ///
    /// # Errors
    ///
    /// `BridgeError::Configuration` for an invalid config or unresolvable
    /// address, `BridgeError::Transport` when the channel cannot be opened.
    pub async fn connect(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        let rm = rmbridge_connect::connect(&config.connect_options()).await?;
        Ok(Self::with_protocol(Arc::new(rm), config))
    }

    /// Build a delegate over an already established protocol client
    pub fn with_protocol(rm: Arc<dyn ResourceManagerProtocol>, config: &BridgeConfig) -> Self {
        Self {
            rm,
            staging: StagingArea::new(&config.staging),
            poll_policy: config.poll_policy(),
        }
    }

    /// Replace the poll policy taken from the configuration
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Application lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Allocate a fresh application id
    ///
    /// Every call returns an independent session.
    pub async fn new_job_id(&self) -> Result<SubmissionSession> {
        let application_id = self.rm.get_new_application_id().await?;
        debug!("Allocated {}", application_id);
        Ok(SubmissionSession { application_id })
    }

    /// Submit `context` under the session's id
    ///
    /// Issues exactly one remote call and never retries it.
    ///
    /// # Errors
    ///
    /// - `BridgeError::Precondition` if `context` already carries an id (no
    ///   remote call is made)
    /// - `BridgeError::Submission` if the resource manager refuses it
    /// - `BridgeError::Transport` if the call could not be delivered
    pub async fn submit_application(
        &self,
        session: SubmissionSession,
        mut context: ApplicationSubmissionContext,
    ) -> Result<ApplicationId> {
        if let Some(existing) = context.application_id {
            return Err(BridgeError::Precondition(format!(
                "Submission context already carries {}; ids come from new_job_id",
                existing
            )));
        }

        let application_id = session.application_id;
        context.application_id = Some(application_id);

        self.rm
            .submit_application(&context)
            .await
            .map_err(BridgeError::from_submission)?;

        info!(
            "Submitted application {} to queue {}",
            application_id, context.queue
        );
        Ok(application_id)
    }

    /// Wait until the application's coordinator runs or can no longer run
    pub async fn get_application_master(
        &self,
        application_id: &ApplicationId,
        cancel: &CancellationToken,
    ) -> Result<ApplicationMaster> {
        poll::wait_until_ready(self.rm.as_ref(), application_id, &self.poll_policy, cancel).await
    }

    /// Accepted and ignored; the resource manager has no job priorities
    pub async fn set_job_priority(&self, job_id: &JobId, priority: JobPriority) -> Result<()> {
        debug!("Ignoring priority {:?} for {}", priority, job_id);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cluster inspection
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn get_active_trackers(&self) -> Result<Vec<TaskTrackerInfo>> {
        let nodes = self.rm.get_cluster_nodes().await?;
        Ok(convert::task_trackers(&nodes))
    }

    pub async fn get_all_jobs(&self) -> Result<Vec<JobStatus>> {
        let reports = self.rm.get_all_applications().await?;
        Ok(convert::job_statuses(&reports))
    }

    /// Slot-based summary of one fresh cluster snapshot
    pub async fn get_cluster_metrics(&self) -> Result<LegacyClusterMetrics> {
        let metrics = self.rm.get_cluster_metrics().await?;
        Ok(convert::cluster_metrics(&metrics))
    }

    pub async fn get_blacklisted_trackers(&self) -> Result<Vec<TaskTrackerInfo>> {
        Err(BridgeError::Unsupported("get_blacklisted_trackers"))
    }

    pub fn get_task_tracker_expiry_interval(&self) -> i64 {
        0
    }

    pub fn get_protocol_version(&self, _protocol: &str, _client_version: i64) -> i64 {
        0
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queues
    // ═══════════════════════════════════════════════════════════════════════

    /// One queue with its jobs, without children
    pub async fn get_queue(&self, queue_name: &str) -> Result<LegacyQueueInfo> {
        let request = QueueInfoRequest::new(queue_name)
            .with_applications(true)
            .with_children(false)
            .recursive(false);
        let queue = self.rm.get_queue_info(&request).await?;
        Ok(convert::queue_info(&queue))
    }

    /// Every queue below `root`, flattened
    pub async fn get_queues(&self) -> Result<Vec<LegacyQueueInfo>> {
        self.flattened(
            QueueInfoRequest::new(ROOT_QUEUE)
                .with_applications(false)
                .with_children(true)
                .recursive(true),
        )
        .await
    }

    /// The direct children of `root`
    pub async fn get_root_queues(&self) -> Result<Vec<LegacyQueueInfo>> {
        self.flattened(
            QueueInfoRequest::new(ROOT_QUEUE)
                .with_applications(false)
                .with_children(true)
                .recursive(false),
        )
        .await
    }

    /// The direct children of `parent`
    pub async fn get_child_queues(&self, parent: &str) -> Result<Vec<LegacyQueueInfo>> {
        self.flattened(
            QueueInfoRequest::new(parent)
                .with_applications(false)
                .with_children(true)
                .recursive(false),
        )
        .await
    }

    async fn flattened(&self, request: QueueInfoRequest) -> Result<Vec<LegacyQueueInfo>> {
        let start = self.rm.get_queue_info(&request).await?;
        let descendants = queues::flatten_descendants(&start)?;
        debug!(
            "Queue '{}' has {} descendants",
            request.queue_name,
            descendants.len()
        );
        Ok(descendants.into_iter().map(convert::queue_info).collect())
    }

    pub async fn get_queue_acls_for_current_user(&self) -> Result<Vec<String>> {
        Err(BridgeError::Unsupported("get_queue_acls_for_current_user"))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Delegation tokens
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn get_delegation_token(&self, _renewer: &str) -> Result<DelegationToken> {
        Err(BridgeError::Unsupported("get_delegation_token"))
    }

    pub async fn renew_delegation_token(&self, _token: &DelegationToken) -> Result<i64> {
        Err(BridgeError::Unsupported("renew_delegation_token"))
    }

    /// Accepted and ignored
    pub async fn cancel_delegation_token(&self, token: &DelegationToken) -> Result<()> {
        debug!("Ignoring cancellation of {} token", token.kind);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Filesystem
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get_filesystem_name(&self) -> &str {
        self.staging.filesystem_name()
    }

    pub fn get_staging_area_dir(&self) -> Result<&Path> {
        self.staging.staging_area_dir()
    }

    /// The system directory, without touching it
    pub fn system_dir(&self) -> &Path {
        self.staging.system_dir()
    }

    /// Delete the system directory recursively and return its path
    pub async fn ensure_clean_system_dir(&self) -> Result<PathBuf> {
        self.staging.ensure_clean_system_dir().await
    }

    /// Legacy lookup of the system directory.
    ///
    /// Callers have always received a freshly emptied directory here, so
    /// this still deletes it. Use [`Self::system_dir`] to only read the path.
    pub async fn get_system_dir(&self) -> Result<PathBuf> {
        self.ensure_clean_system_dir().await
    }
}
