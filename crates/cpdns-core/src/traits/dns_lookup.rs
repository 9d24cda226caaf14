// # DNS Lookup Trait
//
// Abstracts the A record query used by the verifier.
//
// ## Implementations
//
// - hickory-resolver bound to explicit nameservers: `cpdns-resolver-hickory`
//
// Implementations must never fall back to the system resolver configuration:
// the point of querying the registrar's own nameservers is to see changes
// immediately instead of through recursive caches.

use async_trait::async_trait;

/// Trait for A record lookups against an explicit nameserver list
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Query A records for `fqdn`
    ///
    /// # Returns
    ///
    /// - `Ok(addresses)`: textual IPv4 addresses from the answer section
    /// - `Err(Error::Network)`: timeout, NXDOMAIN, SERVFAIL, empty answer or
    ///   any other query failure
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<String>, crate::Error>;

    /// Nameservers this lookup is bound to, listed in the report before the
    /// first query
    fn nameservers(&self) -> Vec<String>;
}
