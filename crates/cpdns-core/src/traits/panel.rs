// # Panel Session Trait
//
// Narrow interface over the control-panel web backend. Everything that knows
// about URLs, cookies and markup sits behind it, so the reconciliation logic
// can be exercised against a test double serving canned tables.
//
// ## Implementations
//
// - Tophost control panel: `cpdns-panel-tophost` crate

use async_trait::async_trait;

use crate::types::RecordTable;

/// Panel login credentials
///
/// The `Debug` implementation never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Stateful, strictly sequential panel session
///
/// # Contract
///
/// - `login` drives the session from anonymous to authenticated. Any
///   transport error or missing cookie is returned as an error and is fatal
///   for the run.
/// - `fetch_record_table` loads and parses the record page once.
/// - `submit_update` posts one mutation and returns the raw response body;
///   interpreting the body is the executor's job.
/// - Implementations pace every request themselves and never retry.
#[async_trait]
pub trait PanelSession: Send {
    /// Establish an authenticated session
    async fn login(&mut self, credentials: &Credentials) -> Result<(), crate::Error>;

    /// Load the record table from the authenticated records page
    async fn fetch_record_table(&mut self) -> Result<RecordTable, crate::Error>;

    /// Submit one mutation
    ///
    /// # Parameters
    ///
    /// - `record_id`: panel-internal id of the row
    /// - `new_value`: value to set
    /// - `previous_value`: value observed on the page, passed through unchanged
    async fn submit_update(
        &mut self,
        record_id: &str,
        new_value: &str,
        previous_value: Option<&str>,
    ) -> Result<String, crate::Error>;

    /// Name used in logs
    fn panel_name(&self) -> &'static str;
}
