//! Change planning

use crate::types::{RecordPlan, ResolutionResult, ResolutionStatus};

/// Why a classified record was left out of the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record already points at the desired IP
    AlreadyUpdated,
    /// The record could not be resolved; writing blind is not allowed
    DnsError,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyUpdated => f.write_str("already updated"),
            SkipReason::DnsError => f.write_str("DNS error"),
        }
    }
}

/// Skip reason for a result, `None` if the record needs a change
pub fn skip_reason(result: &ResolutionResult) -> Option<SkipReason> {
    match result.status {
        ResolutionStatus::Confirmed => Some(SkipReason::AlreadyUpdated),
        ResolutionStatus::Unresolved => Some(SkipReason::DnsError),
        ResolutionStatus::Mismatched => None,
    }
}

/// Records requiring mutation: exactly the `Mismatched` results, in input order
pub fn plan(results: &[ResolutionResult]) -> Vec<RecordPlan> {
    results
        .iter()
        .filter(|r| skip_reason(r).is_none())
        .map(|r| RecordPlan {
            record: r.record.clone(),
        })
        .collect()
}
