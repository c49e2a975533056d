/// Generated gRPC protocol definitions for the resource manager.
///
/// This crate provides the protocol buffer messages and the generated client
/// for `rmbridge.v1.ClientRmService`, the service the delegate talks to.
/// The server side is generated too, for in-process resource managers in tests.
pub mod rmbridge {
    pub mod v1 {
        tonic::include_proto!("rmbridge.v1");
    }
}

// Re-export commonly used types for convenience
pub use rmbridge::v1::*;
