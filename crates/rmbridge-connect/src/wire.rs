//! Mapping between `rmbridge.v1` messages and interface records
//!
//! Outbound mappings are infallible. Inbound mappings reject messages that
//! omit required sub-messages or carry enum values this client does not know.

use rmbridge_interface::{
    ApplicationId, ApplicationMaster, ApplicationReport, ApplicationState,
    ApplicationSubmissionContext, ClusterMetrics, NodeHealth, NodeId, NodeReport, ProtocolError,
    QueueInfo, QueueInfoRequest, QueueState, Resource, Result,
};
use rmbridge_proto::{
    ApplicationIdProto, ApplicationMasterProto, ApplicationReportProto, ApplicationStateProto,
    ApplicationSubmissionContextProto, GetQueueInfoRequestProto, NodeReportProto,
    QueueInfoProto, QueueStateProto, ResourceProto, YarnClusterMetricsProto,
};

fn missing(field: &str) -> ProtocolError {
    ProtocolError::InvalidResponse(format!("Response is missing {}", field))
}

// ═══════════════════════════════════════════════════════════════════════════
// Outbound
// ═══════════════════════════════════════════════════════════════════════════

pub fn application_id_to_proto(id: &ApplicationId) -> ApplicationIdProto {
    ApplicationIdProto {
        cluster_timestamp: id.cluster_timestamp,
        id: id.id,
    }
}

pub fn context_to_proto(context: &ApplicationSubmissionContext) -> ApplicationSubmissionContextProto {
    ApplicationSubmissionContextProto {
        application_id: context.application_id.as_ref().map(application_id_to_proto),
        application_name: context.application_name.clone(),
        queue: context.queue.clone(),
        user: context.user.clone(),
        priority: context.priority,
        resource: Some(ResourceProto {
            memory_mb: context.resource.memory_mb,
        }),
        commands: context.commands.clone(),
        environment: context
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

pub fn queue_request_to_proto(request: &QueueInfoRequest) -> GetQueueInfoRequestProto {
    GetQueueInfoRequestProto {
        queue_name: request.queue_name.clone(),
        include_applications: request.include_applications,
        include_child_queues: request.include_child_queues,
        recursive: request.recursive,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Inbound
// ═══════════════════════════════════════════════════════════════════════════

pub fn application_id_from_proto(id: Option<ApplicationIdProto>) -> Result<ApplicationId> {
    let id = id.ok_or_else(|| missing("application_id"))?;
    Ok(ApplicationId::new(id.cluster_timestamp, id.id))
}

pub fn state_from_proto(value: i32) -> Result<ApplicationState> {
    let state = ApplicationStateProto::try_from(value).map_err(|_| {
        ProtocolError::InvalidResponse(format!("Unknown application state {}", value))
    })?;

    match state {
        ApplicationStateProto::New => Ok(ApplicationState::New),
        ApplicationStateProto::Initializing => Ok(ApplicationState::Initializing),
        ApplicationStateProto::Launched => Ok(ApplicationState::Launched),
        ApplicationStateProto::Running => Ok(ApplicationState::Running),
        ApplicationStateProto::Killed => Ok(ApplicationState::Killed),
        ApplicationStateProto::Failed => Ok(ApplicationState::Failed),
        ApplicationStateProto::Completed => Ok(ApplicationState::Completed),
        ApplicationStateProto::Unspecified => Err(ProtocolError::InvalidResponse(
            "Application state not set".to_string(),
        )),
    }
}

pub fn queue_state_from_proto(value: i32) -> Result<QueueState> {
    match QueueStateProto::try_from(value) {
        Ok(QueueStateProto::Running) => Ok(QueueState::Running),
        Ok(QueueStateProto::Stopped) => Ok(QueueState::Stopped),
        _ => Err(ProtocolError::InvalidResponse(format!(
            "Unknown queue state {}",
            value
        ))),
    }
}

fn resource_from_proto(resource: Option<ResourceProto>) -> Resource {
    resource
        .map(|r| Resource::with_memory(r.memory_mb))
        .unwrap_or_default()
}

pub fn master_from_proto(master: ApplicationMasterProto) -> Result<ApplicationMaster> {
    Ok(ApplicationMaster {
        application_id: application_id_from_proto(master.application_id)?,
        host: master.host,
        rpc_port: master.rpc_port,
        tracking_url: master.tracking_url,
        state: state_from_proto(master.state)?,
        diagnostics: master.diagnostics,
    })
}

pub fn report_from_proto(report: ApplicationReportProto) -> Result<ApplicationReport> {
    Ok(ApplicationReport {
        application_id: application_id_from_proto(report.application_id)?,
        user: report.user,
        queue: report.queue,
        name: report.name,
        state: state_from_proto(report.state)?,
        master_host: report.host,
        master_rpc_port: report.rpc_port,
        tracking_url: report.tracking_url,
        diagnostics: report.diagnostics,
        start_time: report.start_time,
    })
}

/// Map a queue message and everything below it, preserving child order
pub fn queue_from_proto(queue: QueueInfoProto) -> Result<QueueInfo> {
    Ok(QueueInfo {
        state: queue_state_from_proto(queue.state)?,
        queue_name: queue.queue_name,
        capacity: queue.capacity,
        maximum_capacity: queue.maximum_capacity,
        current_capacity: queue.current_capacity,
        child_queues: queue
            .child_queues
            .into_iter()
            .map(queue_from_proto)
            .collect::<Result<Vec<_>>>()?,
        applications: queue
            .applications
            .into_iter()
            .map(report_from_proto)
            .collect::<Result<Vec<_>>>()?,
    })
}

pub fn node_from_proto(node: NodeReportProto) -> Result<NodeReport> {
    let node_id = node.node_id.ok_or_else(|| missing("node_id"))?;
    let health = node.node_health_status.unwrap_or_default();

    Ok(NodeReport {
        node_id: NodeId {
            host: node_id.host,
            port: node_id.port,
        },
        http_address: node.http_address,
        rack_name: node.rack_name,
        used: resource_from_proto(node.used),
        capability: resource_from_proto(node.capability),
        num_containers: node.num_containers,
        health: NodeHealth {
            is_healthy: health.is_node_healthy,
            health_report: health.health_report,
            last_report_time: health.last_health_report_time,
        },
    })
}

pub fn metrics_from_proto(metrics: Option<YarnClusterMetricsProto>) -> Result<ClusterMetrics> {
    let metrics = metrics.ok_or_else(|| missing("cluster_metrics"))?;
    Ok(ClusterMetrics {
        num_node_managers: metrics.num_node_managers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmbridge_proto::NodeIdProto;

    fn proto_id() -> Option<ApplicationIdProto> {
        Some(ApplicationIdProto {
            cluster_timestamp: 1_315_895_242_400,
            id: 3,
        })
    }

    #[test]
    fn test_master_from_proto() {
        let master = master_from_proto(ApplicationMasterProto {
            application_id: proto_id(),
            host: "node-7".to_string(),
            rpc_port: 41000,
            tracking_url: "http://node-7:8088/".to_string(),
            state: ApplicationStateProto::Running as i32,
            diagnostics: String::new(),
        })
        .unwrap();

        assert_eq!(master.application_id, ApplicationId::new(1_315_895_242_400, 3));
        assert_eq!(master.state, ApplicationState::Running);
        assert_eq!(master.host, "node-7");
    }

    #[test]
    fn test_unset_state_is_invalid() {
        let result = master_from_proto(ApplicationMasterProto {
            application_id: proto_id(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ProtocolError::InvalidResponse(_))));
    }

    #[test]
    fn test_missing_application_id_is_invalid() {
        let result = report_from_proto(ApplicationReportProto {
            state: ApplicationStateProto::New as i32,
            ..Default::default()
        });
        assert!(matches!(result, Err(ProtocolError::InvalidResponse(_))));
    }

    #[test]
    fn test_queue_children_keep_service_order() {
        let child = |name: &str| QueueInfoProto {
            queue_name: name.to_string(),
            state: QueueStateProto::Running as i32,
            ..Default::default()
        };
        let root = QueueInfoProto {
            queue_name: "root".to_string(),
            state: QueueStateProto::Running as i32,
            child_queues: vec![child("zeta"), child("alpha"), child("mid")],
            ..Default::default()
        };

        let queue = queue_from_proto(root).unwrap();
        let names: Vec<_> = queue
            .child_queues
            .iter()
            .map(|q| q.queue_name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_context_to_proto_carries_launch_commands() {
        let mut context = ApplicationSubmissionContext::new("wordcount");
        context.application_id = Some(ApplicationId::new(1, 2));
        context.commands = vec!["run-am".to_string()];
        context
            .environment
            .insert("CLASSPATH".to_string(), "/opt/job".to_string());

        let proto = context_to_proto(&context);
        assert_eq!(proto.application_id.map(|id| id.id), Some(2));
        assert_eq!(proto.queue, "default");
        assert_eq!(proto.commands, vec!["run-am".to_string()]);
        assert_eq!(proto.environment.get("CLASSPATH").map(String::as_str), Some("/opt/job"));
    }

    #[test]
    fn test_node_without_health_defaults_to_unhealthy() {
        let node = node_from_proto(NodeReportProto {
            node_id: Some(NodeIdProto {
                host: "node-1".to_string(),
                port: 45454,
            }),
            capability: Some(ResourceProto { memory_mb: 8192 }),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(node.node_id.to_string(), "node-1:45454");
        assert_eq!(node.capability.memory_mb, 8192);
        assert!(!node.health.is_healthy);
    }

    #[test]
    fn test_metrics_required() {
        assert!(metrics_from_proto(None).is_err());
        let metrics = metrics_from_proto(Some(YarnClusterMetricsProto {
            num_node_managers: 5,
        }))
        .unwrap();
        assert_eq!(metrics.num_node_managers, 5);
    }
}
