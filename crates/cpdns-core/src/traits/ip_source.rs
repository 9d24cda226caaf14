// # IP Source Trait
//
// Defines how the engine learns the public IP address records should point to.
//
// ## Implementations
//
// - HTTP IP-echo endpoint: `cpdns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cpdns_core::IpSource;
//
// let source = /* IpSource implementation */;
// let ip = source.current().await?;
// ```

use async_trait::async_trait;

/// Trait for public IP discovery
///
/// # Contract
///
/// - One outbound request per call, no retries. The engine paces the call
///   and treats any error as fatal for the whole run.
/// - The returned text is used verbatim as the desired record value.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the address as served by the endpoint, trimmed
    /// - `Err(Error::Network)`: transport failure, non-2xx status or empty body
    async fn current(&self) -> Result<String, crate::Error>;

    /// Name used in logs
    fn source_name(&self) -> &'static str;
}
