/*!
 * Pure mapping from resource manager records to legacy records
 *
 * Nothing here talks to the network; every function is a projection of the
 * record it is given.
 */

use rmbridge_interface::{
    ApplicationId, ApplicationReport, ApplicationState, ClusterMetrics, NodeReport, QueueInfo,
    QueueState,
};

use crate::legacy::{
    JobId, JobState, JobStatus, LegacyClusterMetrics, LegacyQueueInfo, LegacyQueueState,
    TaskTrackerInfo,
};

/// Map slots the legacy client assumes per node manager
pub const MAP_SLOTS_PER_NODE: i32 = 10;

/// Reduce slots the legacy client assumes per node manager
pub const REDUCE_SLOTS_PER_NODE: i32 = 2;

/// Stand-in for counters the resource manager does not report
pub const PLACEHOLDER_COUNT: i32 = 1;

pub fn job_id(application_id: &ApplicationId) -> JobId {
    JobId::new(application_id.cluster_timestamp, application_id.id)
}

pub fn application_id(job_id: &JobId) -> ApplicationId {
    ApplicationId::new(job_id.tracker_identifier, job_id.id)
}

pub fn job_state(state: ApplicationState) -> JobState {
    match state {
        ApplicationState::New | ApplicationState::Initializing | ApplicationState::Launched => {
            JobState::Prep
        }
        ApplicationState::Running => JobState::Running,
        ApplicationState::Completed => JobState::Succeeded,
        ApplicationState::Failed => JobState::Failed,
        ApplicationState::Killed => JobState::Killed,
    }
}

pub fn job_status(report: &ApplicationReport) -> JobStatus {
    JobStatus {
        job_id: job_id(&report.application_id),
        job_name: report.name.clone(),
        user: report.user.clone(),
        queue: report.queue.clone(),
        state: job_state(report.state),
        tracking_url: report.tracking_url.clone(),
        start_time: report.start_time,
        scheduling_info: report.diagnostics.clone(),
    }
}

pub fn job_statuses(reports: &[ApplicationReport]) -> Vec<JobStatus> {
    reports.iter().map(job_status).collect()
}

pub fn task_tracker(node: &NodeReport) -> TaskTrackerInfo {
    TaskTrackerInfo::new(format!("tracker_{}", node.node_id))
}

pub fn task_trackers(nodes: &[NodeReport]) -> Vec<TaskTrackerInfo> {
    nodes.iter().map(task_tracker).collect()
}

pub fn queue_state(state: QueueState) -> LegacyQueueState {
    match state {
        QueueState::Running => LegacyQueueState::Running,
        QueueState::Stopped => LegacyQueueState::Stopped,
    }
}

/// Convert one queue node; children are not carried over
pub fn queue_info(queue: &QueueInfo) -> LegacyQueueInfo {
    LegacyQueueInfo {
        queue_name: queue.queue_name.clone(),
        scheduling_info: format!(
            "Capacity: {:.1}%, MaximumCapacity: {:.1}%, CurrentCapacity: {:.1}%",
            queue.capacity * 100.0,
            queue.maximum_capacity * 100.0,
            queue.current_capacity * 100.0
        ),
        state: queue_state(queue.state),
        capacity: queue.capacity,
        maximum_capacity: queue.maximum_capacity,
        current_capacity: queue.current_capacity,
        children: Vec::new(),
        job_statuses: job_statuses(&queue.applications),
    }
}

/// Project one resource manager snapshot onto the slot model
pub fn cluster_metrics(metrics: &ClusterMetrics) -> LegacyClusterMetrics {
    let nodes = metrics.num_node_managers;
    LegacyClusterMetrics {
        running_maps: PLACEHOLDER_COUNT,
        running_reduces: PLACEHOLDER_COUNT,
        occupied_map_slots: PLACEHOLDER_COUNT,
        occupied_reduce_slots: PLACEHOLDER_COUNT,
        reserved_map_slots: PLACEHOLDER_COUNT,
        reserved_reduce_slots: PLACEHOLDER_COUNT,
        map_slot_capacity: nodes.saturating_mul(MAP_SLOTS_PER_NODE),
        reduce_slot_capacity: nodes.saturating_mul(REDUCE_SLOTS_PER_NODE),
        total_job_submissions: PLACEHOLDER_COUNT,
        task_trackers: nodes,
        blacklisted_trackers: 0,
        decommissioned_trackers: 0,
    }
}
