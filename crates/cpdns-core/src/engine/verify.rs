//! DNS verification of a single record

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::traits::DnsLookup;
use crate::types::{RecordSpec, ResolutionResult};

/// Classify `record` against `desired_ip`
///
/// Queries the A records of `<record>.<domain>` through `lookup`, which is
/// bound to an explicit nameserver list. Any returned address equal (as text)
/// to `desired_ip` confirms the record. A failed query yields `Unresolved`
/// rather than `Mismatched`, so a flaky nameserver never causes a write.
pub async fn classify(
    record: &RecordSpec,
    domain: &str,
    desired_ip: &str,
    lookup: &dyn DnsLookup,
) -> ResolutionResult {
    let fqdn = record.fqdn(domain);

    match lookup.lookup_a(&fqdn).await {
        Ok(addresses) => {
            let resolved: BTreeSet<String> = addresses.into_iter().collect();
            debug!("{} resolved to {:?}", fqdn, resolved);
            ResolutionResult::from_answers(record.clone(), desired_ip, resolved)
        }
        Err(e) => {
            warn!("DNS query for {} failed: {}", fqdn, e);
            ResolutionResult::unresolved(record.clone(), e.to_string())
        }
    }
}
