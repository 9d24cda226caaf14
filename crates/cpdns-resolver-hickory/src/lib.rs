// # Hickory DNS Lookup
//
// A record lookups for the verifier, bound to an explicit nameserver list.
//
// The resolver is built from scratch with `ResolverConfig::from_parts`: no
// system configuration, no search domains, no fallback to the host's
// recursive resolver. Queries use the absolute name so `ndots` never kicks in.

use async_trait::async_trait;
use cpdns_core::traits::DnsLookup;
use cpdns_core::{Error, Result};
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use std::net::IpAddr;
use std::time::Duration;

/// Standard DNS port
pub const DNS_PORT: u16 = 53;

/// Per-query timeout
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// DNS lookup against explicit nameservers
pub struct HickoryLookup {
    resolver: TokioResolver,
    nameservers: Vec<IpAddr>,
}

impl std::fmt::Debug for HickoryLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryLookup")
            .field("nameservers", &self.nameservers)
            .finish()
    }
}

impl HickoryLookup {
    /// Bind to `nameservers` on port 53
    pub fn new(nameservers: &[IpAddr]) -> Result<Self> {
        Self::with_port(nameservers, DNS_PORT, DEFAULT_QUERY_TIMEOUT)
    }

    /// Bind to `nameservers` on a custom port with a custom query timeout
    pub fn with_port(nameservers: &[IpAddr], port: u16, timeout: Duration) -> Result<Self> {
        if nameservers.is_empty() {
            return Err(Error::config("at least one nameserver is required"));
        }

        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(nameservers, port, true),
        );

        // One attempt per query and one nameserver at a time: retries are not
        // ours to make, and the request pacing covers only a single query
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.num_concurrent_reqs = 1;

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Ok(Self {
            resolver,
            nameservers: nameservers.to_vec(),
        })
    }
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<String>> {
        let absolute = if fqdn.ends_with('.') {
            fqdn.to_string()
        } else {
            format!("{}.", fqdn)
        };

        let lookup = self
            .resolver
            .ipv4_lookup(absolute.as_str())
            .await
            .map_err(|e| Error::network(format!("A lookup for {} failed: {}", fqdn, e)))?;

        let addresses: Vec<String> = lookup.iter().map(|a| a.to_string()).collect();
        tracing::debug!("A {} -> {:?}", fqdn, addresses);
        Ok(addresses)
    }

    fn nameservers(&self) -> Vec<String> {
        self.nameservers.iter().map(IpAddr::to_string).collect()
    }
}
