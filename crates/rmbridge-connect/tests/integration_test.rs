//! Integration tests for rmbridge-connect
//!
//! These tests verify connection establishment failure modes without a
//! resource manager. The last test needs a live one and is ignored by default.

use rmbridge_connect::{connect, ConnectError, ConnectOptions};
use std::time::Duration;

#[tokio::test]
async fn test_unresolvable_host_is_configuration_error() {
    let options = ConnectOptions::new("rm.invalid:8040");

    let result = connect(&options).await;
    assert!(matches!(result, Err(ConnectError::Configuration(_))));
}

#[tokio::test]
async fn test_missing_port_is_configuration_error() {
    let options = ConnectOptions::new("localhost");

    let result = connect(&options).await;
    assert!(matches!(result, Err(ConnectError::Configuration(_))));
}

#[tokio::test]
async fn test_bad_token_fails_before_connecting() {
    let mut options = ConnectOptions::new("127.0.0.1:1");
    options.auth_token = Some("line\nbreak".to_string());

    let result = connect(&options).await;
    assert!(matches!(result, Err(ConnectError::Configuration(_))));
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    // Port 1 (tcpmux) is closed on any sane test host
    let mut options = ConnectOptions::new("127.0.0.1:1");
    options.connect_timeout = Duration::from_secs(2);

    let result = connect(&options).await;
    assert!(matches!(result, Err(ConnectError::Transport(_))));
}

// NOTE: The following test requires a running resource manager and is disabled by default
// To run it, point RMBRIDGE_TEST_RM at the service and remove the #[ignore] attribute

#[tokio::test]
#[ignore]
async fn test_live_cluster_metrics() {
    use rmbridge_interface::ResourceManagerProtocol;

    let address =
        std::env::var("RMBRIDGE_TEST_RM").unwrap_or_else(|_| "localhost:8040".to_string());
    let rm = connect(&ConnectOptions::new(address))
        .await
        .expect("connection failed");

    let metrics = rm.get_cluster_metrics().await.expect("metrics call failed");
    println!("Cluster has {} node managers", metrics.num_node_managers);
    assert!(metrics.num_node_managers >= 0);
}
