//! rmbridge Connect: client-side gRPC connectivity to the resource manager
//!
//! This crate provides the production implementation of
//! [`ResourceManagerProtocol`](rmbridge_interface::ResourceManagerProtocol),
//! talking to `rmbridge.v1.ClientRmService` over a tonic channel.
//!
//! # Architecture
//!
//! - **connect**: resolves the configured address, validates credentials and
//!   establishes the channel exactly once
//! - **RemoteResourceManager**: implements the protocol trait by issuing one
//!   unary call per operation
//! - **wire**: pure mapping between protobuf messages and interface records
//!
//! # Example
//!
//! ```rust,no_run
//! use rmbridge_connect::{connect, ConnectOptions};
//! use rmbridge_interface::ResourceManagerProtocol;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let rm = connect(&ConnectOptions::new("rm.cluster.local:8040")).await?;
//!
//!     // Now use it like any ResourceManagerProtocol
//!     let metrics = rm.get_cluster_metrics().await?;
//!     println!("{} node managers", metrics.num_node_managers);
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod remote;
pub mod wire;

pub use connection::{connect, resolve_address, ConnectOptions, DEFAULT_RM_ADDRESS};
pub use error::ConnectError;
pub use remote::RemoteResourceManager;
