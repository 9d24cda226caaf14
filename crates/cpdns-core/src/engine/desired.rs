//! Desired-state resolution

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pacer::Pacer;
use crate::traits::IpSource;
use crate::types::DesiredState;

/// Determine the IP address records should point to
///
/// An operator override is returned unchanged, without format validation and
/// without any outbound request. Otherwise the IP source is asked exactly
/// once; its failure is returned as a `Network` error, which the engine
/// treats as fatal.
pub async fn resolve_desired_ip(
    override_ip: Option<&str>,
    source: &dyn IpSource,
    pacer: &Pacer,
) -> Result<DesiredState> {
    if let Some(ip) = override_ip {
        debug!("Using desired IP override: {}", ip);
        return Ok(DesiredState::new(ip));
    }

    pacer.wait("public IP discovery").await;
    info!("Discovering public IP via {}", source.source_name());

    let ip = source.current().await.map_err(|e| match e {
        Error::Network(_) => e,
        other => Error::network(other.to_string()),
    })?;

    Ok(DesiredState::new(ip))
}
