//! Testing utilities: an in-memory resource manager
//!
//! [`ScriptedResourceManager`] answers every protocol call from in-memory
//! state, counts calls per operation and lets a test script the sequence of
//! coordinator states or inject a failure into the next call of a given
//! operation.
//!
//! ## Example
//!
//! ```
//! use rmbridge_interface::testing::{Operation, ScriptedResourceManager};
//! use rmbridge_interface::{ApplicationState, ResourceManagerProtocol};
//!
//! # tokio_test::block_on(async {
//! let rm = ScriptedResourceManager::new();
//! let app_id = rm.get_new_application_id().await.unwrap();
//! rm.script_master_states(app_id, [ApplicationState::New, ApplicationState::Running]);
//!
//! let first = rm.get_application_master(&app_id).await.unwrap();
//! let second = rm.get_application_master(&app_id).await.unwrap();
//! assert_eq!(first.state, ApplicationState::New);
//! assert_eq!(second.state, ApplicationState::Running);
//! assert_eq!(rm.calls(Operation::GetApplicationMaster), 2);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::{
    ApplicationId, ApplicationMaster, ApplicationReport, ApplicationState,
    ApplicationSubmissionContext, ClusterMetrics, NodeReport, ProtocolError, QueueInfo,
    QueueInfoRequest, ResourceManagerProtocol, Result,
};

/// Cluster timestamp stamped on every id the fake allocates
pub const SCRIPTED_CLUSTER_TIMESTAMP: i64 = 1_315_895_242_400;

/// Protocol operations, used to count calls and target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetNewApplicationId,
    SubmitApplication,
    GetApplicationMaster,
    GetAllApplications,
    GetClusterNodes,
    GetClusterMetrics,
    GetQueueInfo,
}

#[derive(Debug, Default)]
struct ScriptState {
    next_sequence: i32,
    master_scripts: HashMap<ApplicationId, VecDeque<ApplicationState>>,
    submitted: Vec<ApplicationSubmissionContext>,
    queue_root: Option<QueueInfo>,
    queue_requests: Vec<QueueInfoRequest>,
    applications: Vec<ApplicationReport>,
    nodes: Vec<NodeReport>,
    metrics: ClusterMetrics,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, VecDeque<ProtocolError>>,
}

/// In-memory resource manager with scripted answers
///
/// Cheap to clone; clones share state so a test can keep a handle while the
/// delegate owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResourceManager {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// States returned by successive coordinator queries for `app_id`
    ///
    /// The last state repeats once the script is exhausted.
    pub fn script_master_states(
        &self,
        app_id: ApplicationId,
        states: impl IntoIterator<Item = ApplicationState>,
    ) {
        let mut state = self.state.lock().unwrap();
        state
            .master_scripts
            .insert(app_id, states.into_iter().collect());
    }

    /// Install the queue hierarchy served by `get_queue_info`
    pub fn set_queue_tree(&self, root: QueueInfo) {
        self.state.lock().unwrap().queue_root = Some(root);
    }

    pub fn set_applications(&self, applications: Vec<ApplicationReport>) {
        self.state.lock().unwrap().applications = applications;
    }

    pub fn set_nodes(&self, nodes: Vec<NodeReport>) {
        self.state.lock().unwrap().nodes = nodes;
    }

    pub fn set_metrics(&self, metrics: ClusterMetrics) {
        self.state.lock().unwrap().metrics = metrics;
    }

    /// Make the next call of `operation` fail with `error`
    ///
    /// Multiple injections for the same operation are consumed in order.
    pub fn fail_next(&self, operation: Operation, error: ProtocolError) {
        let mut state = self.state.lock().unwrap();
        state
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls received for `operation`, failed ones included
    pub fn calls(&self, operation: Operation) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.get(&operation).copied().unwrap_or(0)
    }

    /// Contexts accepted by `submit_application`, in order
    pub fn submitted(&self) -> Vec<ApplicationSubmissionContext> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Queue requests received, in order
    pub fn queue_requests(&self) -> Vec<QueueInfoRequest> {
        self.state.lock().unwrap().queue_requests.clone()
    }

    /// Count the call and pop an injected failure, if any
    fn enter(&self, operation: Operation) -> Result<std::sync::MutexGuard<'_, ScriptState>> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(operation).or_insert(0) += 1;
        debug!(?operation, "scripted resource manager call");

        if let Some(err) = state
            .failures
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front())
        {
            return Err(err);
        }
        Ok(state)
    }
}

/// Find `name` in the tree rooted at `node`
fn find_queue<'a>(node: &'a QueueInfo, name: &str) -> Option<&'a QueueInfo> {
    if node.queue_name == name {
        return Some(node);
    }
    node.child_queues
        .iter()
        .find_map(|child| find_queue(child, name))
}

/// Copy of `node` trimmed the way the service trims it for `request`
fn shape_queue(node: &QueueInfo, request: &QueueInfoRequest, depth: usize) -> QueueInfo {
    let descend = request.include_child_queues && (request.recursive || depth == 0);

    QueueInfo {
        queue_name: node.queue_name.clone(),
        capacity: node.capacity,
        maximum_capacity: node.maximum_capacity,
        current_capacity: node.current_capacity,
        state: node.state,
        child_queues: if descend {
            node.child_queues
                .iter()
                .map(|child| shape_queue(child, request, depth + 1))
                .collect()
        } else {
            Vec::new()
        },
        applications: if request.include_applications {
            node.applications.clone()
        } else {
            Vec::new()
        },
    }
}

#[async_trait]
impl ResourceManagerProtocol for ScriptedResourceManager {
    async fn get_new_application_id(&self) -> Result<ApplicationId> {
        let mut state = self.enter(Operation::GetNewApplicationId)?;
        state.next_sequence += 1;
        Ok(ApplicationId::new(
            SCRIPTED_CLUSTER_TIMESTAMP,
            state.next_sequence,
        ))
    }

    async fn submit_application(&self, context: &ApplicationSubmissionContext) -> Result<()> {
        let mut state = self.enter(Operation::SubmitApplication)?;

        let app_id = context.application_id.ok_or_else(|| {
            ProtocolError::rejected("submit_application", "context carries no application id")
        })?;

        state
            .master_scripts
            .entry(app_id)
            .or_insert_with(|| VecDeque::from([ApplicationState::Running]));
        state.submitted.push(context.clone());
        Ok(())
    }

    async fn get_application_master(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationMaster> {
        let mut state = self.enter(Operation::GetApplicationMaster)?;

        let script = state
            .master_scripts
            .get_mut(application_id)
            .ok_or(ProtocolError::ApplicationNotFound(*application_id))?;

        let next = match script.len() {
            0 | 1 => script.front().copied(),
            _ => script.pop_front(),
        };
        let current = next.ok_or(ProtocolError::ApplicationNotFound(*application_id))?;

        let mut master = ApplicationMaster::pending(*application_id, current);
        if current == ApplicationState::Running {
            master.host = "am-host.cluster.local".to_string();
            master.rpc_port = 41000;
            master.tracking_url = format!("http://am-host.cluster.local:8088/{}", application_id);
        }
        Ok(master)
    }

    async fn get_all_applications(&self) -> Result<Vec<ApplicationReport>> {
        let state = self.enter(Operation::GetAllApplications)?;
        Ok(state.applications.clone())
    }

    async fn get_cluster_nodes(&self) -> Result<Vec<NodeReport>> {
        let state = self.enter(Operation::GetClusterNodes)?;
        Ok(state.nodes.clone())
    }

    async fn get_cluster_metrics(&self) -> Result<ClusterMetrics> {
        let state = self.enter(Operation::GetClusterMetrics)?;
        Ok(state.metrics)
    }

    async fn get_queue_info(&self, request: &QueueInfoRequest) -> Result<QueueInfo> {
        let mut state = self.enter(Operation::GetQueueInfo)?;
        state.queue_requests.push(request.clone());

        let root = state
            .queue_root
            .as_ref()
            .ok_or_else(|| ProtocolError::QueueNotFound(request.queue_name.clone()))?;
        let node = find_queue(root, &request.queue_name)
            .ok_or_else(|| ProtocolError::QueueNotFound(request.queue_name.clone()))?;

        Ok(shape_queue(node, request, 0))
    }
}
