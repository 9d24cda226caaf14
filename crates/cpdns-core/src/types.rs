//! Data model of a reconciliation run
//!
//! Everything here is created once and read afterwards. Results are plain
//! values so they can be aggregated into a report and asserted in tests.

use std::collections::BTreeSet;

/// The IP address every managed record should point to
///
/// Computed once per run. The value is kept as text: an operator override is
/// passed through without format validation and compared verbatim against
/// resolver answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub ip: String,
}

impl DesiredState {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

/// One managed host label (e.g. `esx1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordSpec {
    pub name: String,
}

impl RecordSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Fully-qualified name `<label>.<domain>`
    pub fn fqdn(&self, domain: &str) -> String {
        format!("{}.{}", self.name, domain.trim_end_matches('.'))
    }
}

impl std::fmt::Display for RecordSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of checking one record against the desired IP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStatus {
    /// The desired IP is among the resolved addresses
    Confirmed,
    /// The query succeeded but the desired IP is not among the answers
    Mismatched,
    /// The query itself failed (timeout, NXDOMAIN, SERVFAIL, ...)
    Unresolved,
}

/// Classification of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub record: RecordSpec,
    pub resolved_ips: BTreeSet<String>,
    pub status: ResolutionStatus,
    /// Resolver error text, set only for `Unresolved`
    pub error: Option<String>,
}

impl ResolutionResult {
    /// Classify a successful answer set
    ///
    /// `Confirmed` holds exactly when `desired_ip` is one of `resolved_ips`.
    pub fn from_answers(
        record: RecordSpec,
        desired_ip: &str,
        resolved_ips: BTreeSet<String>,
    ) -> Self {
        let status = if resolved_ips.contains(desired_ip) {
            ResolutionStatus::Confirmed
        } else {
            ResolutionStatus::Mismatched
        };

        Self {
            record,
            resolved_ips,
            status,
            error: None,
        }
    }

    /// Record a failed query
    pub fn unresolved(record: RecordSpec, error: impl Into<String>) -> Self {
        Self {
            record,
            resolved_ips: BTreeSet::new(),
            status: ResolutionStatus::Unresolved,
            error: Some(error.into()),
        }
    }
}

/// A record selected for mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPlan {
    pub record: RecordSpec,
}

/// One row of the panel's record table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRecord {
    /// Panel-internal identifier (the `<id>` of `name-<id>`)
    pub id: String,
    /// Displayed host label
    pub name: String,
    /// Displayed value, `None` when the row has no value cell
    pub current_value: Option<String>,
}

/// Snapshot of the panel's record table from a single page load
///
/// Rows keep document order. Never refreshed during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: Vec<PanelRecord>,
}

impl RecordTable {
    pub fn new(records: Vec<PanelRecord>) -> Self {
        Self { records }
    }

    /// First row (in document order) whose name equals `name` exactly
    pub fn find(&self, name: &str) -> Option<&PanelRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn records(&self) -> &[PanelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of one attempted mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub record: RecordSpec,
    /// Panel id used for the mutation, `None` if the record was not found
    pub id: Option<String>,
    pub success: bool,
    /// Id reported back by the panel after a successful change
    pub new_id: Option<String>,
    pub message: String,
}
