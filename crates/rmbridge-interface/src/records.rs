//! Record types exchanged with the resource manager

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Cluster-assigned handle for one submitted application
///
/// Rendered as `application_<cluster timestamp>_<sequence>`, the sequence
/// zero-padded to four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId {
    /// Start time of the resource manager that issued the id (ms since epoch)
    pub cluster_timestamp: i64,

    /// Sequence number within that resource manager's lifetime
    pub id: i32,
}

impl ApplicationId {
    pub const PREFIX: &'static str = "application";

    pub fn new(cluster_timestamp: i64, id: i32) -> Self {
        Self {
            cluster_timestamp,
            id,
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{:04}",
            Self::PREFIX,
            self.cluster_timestamp,
            self.id
        )
    }
}

impl FromStr for ApplicationId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidResponse(format!("Malformed application id: {}", s));

        let mut parts = s.split('_');
        if parts.next() != Some(Self::PREFIX) {
            return Err(invalid());
        }
        let cluster_timestamp = parts
            .next()
            .and_then(|p| p.parse::<i64>().ok())
            .ok_or_else(invalid)?;
        let id = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self::new(cluster_timestamp, id))
    }
}

/// State of an application's coordinating process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationState {
    New,
    Initializing,
    Launched,
    Running,
    Killed,
    Failed,
    Completed,
}

impl ApplicationState {
    /// Whether a poller waiting for the coordinator can stop
    ///
    /// The coordinator is either up (`Running`) or will never come up
    /// (`Killed`, `Failed`, `Completed`).
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            ApplicationState::Running
                | ApplicationState::Killed
                | ApplicationState::Failed
                | ApplicationState::Completed
        )
    }

    /// Whether the application has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationState::Killed | ApplicationState::Failed | ApplicationState::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationState::New => "NEW",
            ApplicationState::Initializing => "INITIALIZING",
            ApplicationState::Launched => "LAUNCHED",
            ApplicationState::Running => "RUNNING",
            ApplicationState::Killed => "KILLED",
            ApplicationState::Failed => "FAILED",
            ApplicationState::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record of an application master
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationMaster {
    pub application_id: ApplicationId,
    pub host: String,
    pub rpc_port: i32,
    pub tracking_url: String,
    pub state: ApplicationState,
    #[serde(default)]
    pub diagnostics: String,
}

impl ApplicationMaster {
    /// A master record with no host assigned yet
    pub fn pending(application_id: ApplicationId, state: ApplicationState) -> Self {
        Self {
            application_id,
            host: String::new(),
            rpc_port: 0,
            tracking_url: String::new(),
            state,
            diagnostics: String::new(),
        }
    }
}

/// One application as listed by the resource manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub application_id: ApplicationId,
    pub user: String,
    pub queue: String,
    pub name: String,
    pub state: ApplicationState,
    pub master_host: String,
    pub master_rpc_port: i32,
    pub tracking_url: String,
    #[serde(default)]
    pub diagnostics: String,
    /// Submission time (ms since epoch)
    pub start_time: i64,
}

/// Resource request or capability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub memory_mb: i32,
}

impl Resource {
    pub fn with_memory(memory_mb: i32) -> Self {
        Self { memory_mb }
    }
}

/// Full description of an application to run
///
/// Built by the caller without an id; the delegate stamps the id allocated
/// for the submission session before handing it to the resource manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmissionContext {
    #[serde(default)]
    pub application_id: Option<ApplicationId>,
    pub application_name: String,
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub resource: Resource,
    /// Commands run to launch the application master
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

fn default_queue() -> String {
    "default".to_string()
}

impl ApplicationSubmissionContext {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            queue: default_queue(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueState {
    Running,
    Stopped,
}

/// One node of the resource manager's queue hierarchy
///
/// `child_queues` is populated only as deep as the request asked for; the
/// tree is owned by the caller for the duration of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub queue_name: String,
    /// Configured share of the parent, 0.0..=1.0
    pub capacity: f32,
    pub maximum_capacity: f32,
    pub current_capacity: f32,
    pub state: QueueState,
    #[serde(default)]
    pub child_queues: Vec<QueueInfo>,
    #[serde(default)]
    pub applications: Vec<ApplicationReport>,
}

impl QueueInfo {
    /// A running leaf queue with the given capacity
    pub fn leaf(queue_name: impl Into<String>, capacity: f32) -> Self {
        Self {
            queue_name: queue_name.into(),
            capacity,
            maximum_capacity: 1.0,
            current_capacity: 0.0,
            state: QueueState::Running,
            child_queues: Vec::new(),
            applications: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<QueueInfo>) -> Self {
        self.child_queues = children;
        self
    }
}

/// Shape of a queue query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfoRequest {
    pub queue_name: String,
    pub include_applications: bool,
    pub include_child_queues: bool,
    pub recursive: bool,
}

impl QueueInfoRequest {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            include_applications: false,
            include_child_queues: false,
            recursive: false,
        }
    }

    pub fn with_applications(mut self, include: bool) -> Self {
        self.include_applications = include;
        self
    }

    pub fn with_children(mut self, include: bool) -> Self {
        self.include_child_queues = include;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub host: String,
    pub port: i32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHealth {
    pub is_healthy: bool,
    pub health_report: String,
    /// ms since epoch
    pub last_report_time: i64,
}

/// One node manager registered with the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    pub node_id: NodeId,
    pub http_address: String,
    pub rack_name: String,
    pub used: Resource,
    pub capability: Resource,
    pub num_containers: i32,
    pub health: NodeHealth,
}

/// Aggregate cluster snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMetrics {
    pub num_node_managers: i32,
}
