/*!
 * Legacy job-client record model
 *
 * These are the shapes the job client understands: jobs instead of
 * applications, task trackers instead of nodes, slot-based cluster metrics.
 * Values are produced by [`crate::convert`] from resource manager records.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Legacy job identifier: `job_<cluster timestamp>_<sequence>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId {
    /// Start time of the issuing cluster, in milliseconds
    pub tracker_identifier: i64,

    pub id: i32,
}

impl JobId {
    pub fn new(tracker_identifier: i64, id: i32) -> Self {
        Self {
            tracker_identifier,
            id,
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job_{}_{:04}", self.tracker_identifier, self.id)
    }
}

impl FromStr for JobId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BridgeError::Precondition(format!("Malformed job id: {}", s));

        let rest = s.strip_prefix("job_").ok_or_else(invalid)?;
        let (tracker, id) = rest.split_once('_').ok_or_else(invalid)?;
        let tracker_identifier = tracker.parse::<i64>().map_err(|_| invalid())?;
        let id = id.parse::<i32>().map_err(|_| invalid())?;

        Ok(Self::new(tracker_identifier, id))
    }
}

/// Legacy run state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Prep,
    Running,
    Succeeded,
    Failed,
    Killed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Prep => "PREP",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Killed => "KILLED",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Killed
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legacy job priority; accepted by `set_job_priority` and otherwise ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPriority {
    VeryHigh,
    High,
    #[default]
    Normal,
    Low,
    VeryLow,
}

/// Status of one job as listed to the legacy client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub job_name: String,
    pub user: String,
    pub queue: String,
    pub state: JobState,

    /// Tracking URL of the coordinator, empty until it registers
    pub tracking_url: String,

    /// Epoch milliseconds
    pub start_time: i64,

    /// Free-form scheduling information (the coordinator's diagnostics)
    pub scheduling_info: String,
}

/// A node as seen by the legacy client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTrackerInfo {
    /// `tracker_<host>:<port>`
    pub tracker_name: String,
}

impl TaskTrackerInfo {
    pub fn new(tracker_name: impl Into<String>) -> Self {
        Self {
            tracker_name: tracker_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyQueueState {
    Running,
    Stopped,
}

impl fmt::Display for LegacyQueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyQueueState::Running => f.write_str("running"),
            LegacyQueueState::Stopped => f.write_str("stopped"),
        }
    }
}

/// A queue as seen by the legacy client
///
/// Children are never populated by flattening operations; they return every
/// descendant as a sibling in one flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyQueueInfo {
    pub queue_name: String,

    /// Human-readable capacity summary
    pub scheduling_info: String,

    pub state: LegacyQueueState,

    pub capacity: f32,
    pub maximum_capacity: f32,
    pub current_capacity: f32,

    #[serde(default)]
    pub children: Vec<LegacyQueueInfo>,

    /// Jobs in the queue, present only for single-queue lookups
    #[serde(default)]
    pub job_statuses: Vec<JobStatus>,
}

/// Slot-based cluster summary understood by the legacy client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyClusterMetrics {
    pub running_maps: i32,
    pub running_reduces: i32,
    pub occupied_map_slots: i32,
    pub occupied_reduce_slots: i32,
    pub reserved_map_slots: i32,
    pub reserved_reduce_slots: i32,
    pub map_slot_capacity: i32,
    pub reduce_slot_capacity: i32,
    pub total_job_submissions: i32,
    pub task_trackers: i32,
    pub blacklisted_trackers: i32,
    pub decommissioned_trackers: i32,
}

/// Opaque delegation token, accepted for cancellation and otherwise ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationToken {
    pub identifier: Vec<u8>,
    pub password: Vec<u8>,
    pub kind: String,
    pub service: String,
}
