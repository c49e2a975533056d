//! Connection establishment: address resolution, endpoint setup, credentials

use crate::error::ConnectError;
use crate::remote::RemoteResourceManager;
use std::net::SocketAddr;
use std::time::Duration;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{ClientTlsConfig, Endpoint};
use tracing::{debug, info};

/// Default client bind address of the resource manager
pub const DEFAULT_RM_ADDRESS: &str = "0.0.0.0:8040";

/// Everything needed to reach the resource manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// `host:port` of the resource manager's client service
    pub address: String,

    /// Bearer token attached to every request (optional)
    pub auth_token: Option<String>,

    /// Server name to verify; enables TLS when set
    pub tls_domain: Option<String>,

    pub connect_timeout: Duration,

    pub request_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            address: DEFAULT_RM_ADDRESS.to_string(),
            auth_token: None,
            tls_domain: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }
}

/// Resolve `host:port` to the first socket address it names
pub async fn resolve_address(address: &str) -> Result<SocketAddr, ConnectError> {
    let mut candidates = tokio::net::lookup_host(address).await.map_err(|e| {
        ConnectError::Configuration(format!(
            "Cannot resolve resource manager address '{}': {}",
            address, e
        ))
    })?;

    candidates.next().ok_or_else(|| {
        ConnectError::Configuration(format!(
            "Resource manager address '{}' resolved to nothing",
            address
        ))
    })
}

/// Parse the bearer credential, before any network activity
fn authorization_value(
    token: Option<&str>,
) -> Result<Option<MetadataValue<Ascii>>, ConnectError> {
    token
        .map(|t| format!("Bearer {}", t).parse::<MetadataValue<Ascii>>())
        .transpose()
        .map_err(ConnectError::from)
}

/// Build the endpoint for a resolved address
fn build_endpoint(addr: SocketAddr, options: &ConnectOptions) -> Result<Endpoint, ConnectError> {
    let scheme = if options.tls_domain.is_some() {
        "https"
    } else {
        "http"
    };

    let endpoint = Endpoint::from_shared(format!("{}://{}", scheme, addr))
        .map_err(|e| ConnectError::Configuration(format!("Invalid endpoint: {}", e)))?
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout);

    match &options.tls_domain {
        Some(domain) => endpoint
            .tls_config(
                ClientTlsConfig::new()
                    .domain_name(domain.clone())
                    .with_native_roots(),
            )
            .map_err(|e| ConnectError::Configuration(format!("Invalid TLS settings: {}", e))),
        None => Ok(endpoint),
    }
}

/// Establish the single client connection to the resource manager
///
/// This will:
/// 1. Validate the credential
/// 2. Resolve the configured address
/// 3. Connect the gRPC channel
///
/// Nothing is retried. On error no client exists.
///
/// # Errors
///
/// - `ConnectError::Configuration` if the address cannot be resolved or the
///   endpoint/credential settings are invalid
/// - `ConnectError::Transport` if the channel cannot be established
pub async fn connect(options: &ConnectOptions) -> Result<RemoteResourceManager, ConnectError> {
    let authorization = authorization_value(options.auth_token.as_deref())?;
    let addr = resolve_address(&options.address).await?;

    info!("Connecting to ResourceManager at {}", addr);

    let endpoint = build_endpoint(addr, options)?;
    debug!(
        "Endpoint ready (tls: {}, connect timeout: {:?})",
        options.tls_domain.is_some(),
        options.connect_timeout
    );

    let channel = endpoint.connect().await?;

    info!("Connected to ResourceManager at {}", addr);

    Ok(RemoteResourceManager::new(channel, addr, authorization))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConnectOptions::default();
        assert_eq!(options.address, DEFAULT_RM_ADDRESS);
        assert!(options.auth_token.is_none());
        assert!(options.tls_domain.is_none());
    }

    #[tokio::test]
    async fn test_resolve_literal_address() {
        let addr = resolve_address("127.0.0.1:8040").await.unwrap();
        assert_eq!(addr, "127.0.0.1:8040".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_address_without_port() {
        let result = resolve_address("127.0.0.1").await;
        assert!(matches!(result, Err(ConnectError::Configuration(_))));
    }

    #[test]
    fn test_token_with_control_characters_is_rejected() {
        let result = authorization_value(Some("bad\ntoken"));
        assert!(matches!(result, Err(ConnectError::Configuration(_))));

        let value = authorization_value(Some("abc")).unwrap().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
    }

    #[test]
    fn test_plain_endpoint_uses_http() {
        let addr: SocketAddr = "10.0.0.5:8040".parse().unwrap();
        let endpoint = build_endpoint(addr, &ConnectOptions::default()).unwrap();
        assert_eq!(endpoint.uri().scheme_str(), Some("http"));
        assert_eq!(endpoint.uri().authority().unwrap().as_str(), "10.0.0.5:8040");
    }
}
