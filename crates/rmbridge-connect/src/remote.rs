//! RemoteResourceManager: ResourceManagerProtocol over gRPC

use async_trait::async_trait;
use rmbridge_interface::{
    ApplicationId, ApplicationMaster, ApplicationReport, ApplicationSubmissionContext,
    ClusterMetrics, NodeReport, ProtocolError, QueueInfo, QueueInfoRequest,
    ResourceManagerProtocol, Result,
};
use rmbridge_proto::client_rm_service_client::ClientRmServiceClient;
use rmbridge_proto::{
    GetAllApplicationsRequestProto, GetApplicationMasterRequestProto,
    GetClusterMetricsRequestProto, GetClusterNodesRequestProto, GetNewApplicationIdRequestProto,
    SubmitApplicationRequestProto,
};
use std::net::SocketAddr;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::Channel;
use tonic::Code;
use tracing::debug;

use crate::error::status_error;
use crate::wire;

/// Metadata key carrying the bearer token
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// The resource manager reached through a gRPC channel.
///
/// This struct is cheaply cloneable (tonic's Channel is internally shared).
/// Use [`crate::connect`] to resolve the address and establish the channel.
#[derive(Clone)]
pub struct RemoteResourceManager {
    client: ClientRmServiceClient<Channel>,

    /// `Bearer <token>`, attached to every request when present
    authorization: Option<MetadataValue<Ascii>>,

    address: SocketAddr,
}

impl RemoteResourceManager {
    /// Wrap an established channel.
    ///
    /// This constructor assumes the channel is already connected to `address`.
    pub fn new(
        channel: Channel,
        address: SocketAddr,
        authorization: Option<MetadataValue<Ascii>>,
    ) -> Self {
        Self {
            client: ClientRmServiceClient::new(channel),
            authorization,
            address,
        }
    }

    /// Resolved address of the resource manager
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Wrap a message and attach credentials
    fn with_auth<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        if let Some(value) = &self.authorization {
            request
                .metadata_mut()
                .insert(AUTHORIZATION_HEADER, value.clone());
        }
        request
    }
}

#[async_trait]
impl ResourceManagerProtocol for RemoteResourceManager {
    async fn get_new_application_id(&self) -> Result<ApplicationId> {
        debug!("Requesting new application id from {}", self.address);

        let response = self
            .client
            .clone()
            .get_new_application_id(self.with_auth(GetNewApplicationIdRequestProto {}))
            .await
            .map_err(|s| status_error("get_new_application_id", s))?;

        wire::application_id_from_proto(response.into_inner().application_id)
    }

    async fn submit_application(&self, context: &ApplicationSubmissionContext) -> Result<()> {
        debug!(
            "Submitting application {:?} to queue {}",
            context.application_id, context.queue
        );

        let request = SubmitApplicationRequestProto {
            application_submission_context: Some(wire::context_to_proto(context)),
        };

        self.client
            .clone()
            .submit_application(self.with_auth(request))
            .await
            .map_err(|s| status_error("submit_application", s))?;

        Ok(())
    }

    async fn get_application_master(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationMaster> {
        debug!("Querying application master of {}", application_id);

        let request = GetApplicationMasterRequestProto {
            application_id: Some(wire::application_id_to_proto(application_id)),
        };

        let response = self
            .client
            .clone()
            .get_application_master(self.with_auth(request))
            .await
            .map_err(|s| match s.code() {
                Code::NotFound => ProtocolError::ApplicationNotFound(*application_id),
                _ => status_error("get_application_master", s),
            })?;

        let master = response
            .into_inner()
            .application_master
            .ok_or_else(|| {
                ProtocolError::InvalidResponse("Response is missing application_master".to_string())
            })?;

        wire::master_from_proto(master)
    }

    async fn get_all_applications(&self) -> Result<Vec<ApplicationReport>> {
        let response = self
            .client
            .clone()
            .get_all_applications(self.with_auth(GetAllApplicationsRequestProto {}))
            .await
            .map_err(|s| status_error("get_all_applications", s))?;

        let reports = response.into_inner().applications;
        debug!("Received {} application reports", reports.len());

        reports.into_iter().map(wire::report_from_proto).collect()
    }

    async fn get_cluster_nodes(&self) -> Result<Vec<NodeReport>> {
        let response = self
            .client
            .clone()
            .get_cluster_nodes(self.with_auth(GetClusterNodesRequestProto {}))
            .await
            .map_err(|s| status_error("get_cluster_nodes", s))?;

        let nodes = response.into_inner().node_reports;
        debug!("Received {} node reports", nodes.len());

        nodes.into_iter().map(wire::node_from_proto).collect()
    }

    async fn get_cluster_metrics(&self) -> Result<ClusterMetrics> {
        let response = self
            .client
            .clone()
            .get_cluster_metrics(self.with_auth(GetClusterMetricsRequestProto {}))
            .await
            .map_err(|s| status_error("get_cluster_metrics", s))?;

        wire::metrics_from_proto(response.into_inner().cluster_metrics)
    }

    async fn get_queue_info(&self, request: &QueueInfoRequest) -> Result<QueueInfo> {
        debug!(
            queue = %request.queue_name,
            children = request.include_child_queues,
            recursive = request.recursive,
            "Fetching queue info"
        );

        let response = self
            .client
            .clone()
            .get_queue_info(self.with_auth(wire::queue_request_to_proto(request)))
            .await
            .map_err(|s| match s.code() {
                Code::NotFound => ProtocolError::QueueNotFound(request.queue_name.clone()),
                _ => status_error("get_queue_info", s),
            })?;

        let queue = response.into_inner().queue_info.ok_or_else(|| {
            ProtocolError::QueueNotFound(request.queue_name.clone())
        })?;

        wire::queue_from_proto(queue)
    }
}
