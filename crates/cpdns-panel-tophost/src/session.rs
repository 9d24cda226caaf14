//! Authenticated panel session
//!
//! ## State machine
//!
//! ```text
//! Anonymous
//!   │ GET  /dns              (PHPSESSID must be set)
//!   ▼
//! SessionEstablished
//!   │ POST /x-login          (form: user, pass)
//!   ▼
//! AuthenticatedPending
//!   │ GET  /x-httpsstatus    (nodo must be set)
//!   ▼
//! Authenticated
//!   │ GET  /dns              (record table)
//!   ▼
//! RecordsLoaded ──▶ POST /x-dns-mod (form: record, value, valueo) per update
//! ```
//!
//! Each transition is one round trip through the shared [`Pacer`]. The
//! login response carries no failure signal of its own: wrong credentials
//! only show up as a missing `nodo` cookie one step later, which is why a
//! rejected login and a broken session are the same `Auth` error here.

use async_trait::async_trait;
use cpdns_core::traits::{Credentials, PanelSession};
use cpdns_core::types::RecordTable;
use cpdns_core::{Error, Pacer, Result};
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::markup::parse_record_table;

/// Cookie set by the landing page
pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Cookie set by the status check once the login was accepted
pub const NODE_COOKIE: &str = "nodo";

const DNS_PATH: &str = "/dns";
const LOGIN_PATH: &str = "/x-login";
const STATUS_PATH: &str = "/x-httpsstatus";
const MUTATION_PATH: &str = "/x-dns-mod";

/// The panel rejects clients that do not look like a browser
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Position in the login sequence
#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    SessionEstablished { session_cookie: String },
    AuthenticatedPending,
    Authenticated { node_cookie: String },
    RecordsLoaded { rows: usize },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::SessionEstablished { .. } => "session-established",
            SessionState::AuthenticatedPending => "authenticated-pending",
            SessionState::Authenticated { .. } => "authenticated",
            SessionState::RecordsLoaded { .. } => "records-loaded",
        }
    }

    fn is_authenticated(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated { .. } | SessionState::RecordsLoaded { .. }
        )
    }
}

// Cookie values are session secrets
impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

struct Endpoints {
    base: Url,
    dns: Url,
    login: Url,
    status: Url,
    mutation: Url,
}

impl Endpoints {
    fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid panel URL {}: {}", base_url, e)))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| Error::config(format!("invalid panel path {}: {}", path, e)))
        };

        Ok(Self {
            dns: join(DNS_PATH)?,
            login: join(LOGIN_PATH)?,
            status: join(STATUS_PATH)?,
            mutation: join(MUTATION_PATH)?,
            base,
        })
    }
}

/// Tophost control-panel session
///
/// Holds the cookie jar for the lifetime of one run. Nothing is persisted.
pub struct TophostPanel {
    endpoints: Endpoints,
    client: reqwest::Client,
    jar: Arc<Jar>,
    pacer: Pacer,
    state: SessionState,
}

impl std::fmt::Debug for TophostPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TophostPanel")
            .field("base_url", &self.endpoints.base.as_str())
            .field("state", &self.state)
            .finish()
    }
}

impl TophostPanel {
    /// Create an anonymous session against `base_url`
    ///
    /// # Parameters
    ///
    /// - `base_url`: panel root, e.g. `https://cp.tophost.it`
    /// - `pacer`: shared request pacer, applied before every request
    pub fn new(base_url: &str, pacer: Pacer) -> Result<Self> {
        let endpoints = Endpoints::new(base_url)?;
        let jar = Arc::new(Jar::default());

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            endpoints,
            client,
            jar,
            pacer,
            state: SessionState::Anonymous,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Value of cookie `name` as it would be sent to the panel
    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.endpoints.base)?;
        let header = header.to_str().ok()?;

        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    fn required_cookie(&self, name: &str, step: &str) -> Result<String> {
        self.cookie(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::auth(format!(
                    "cookie '{}' not set after {} (rejected credentials or lost session)",
                    name, step
                ))
            })
    }

    async fn get(&self, url: &Url, label: &str) -> Result<reqwest::Response> {
        self.pacer.wait(label).await;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::network(format!("{} failed: {}", label, e)))?;

        check_status(response, label)
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, &str)],
        label: &str,
    ) -> Result<reqwest::Response> {
        self.pacer.wait(label).await;
        self.client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| Error::network(format!("{} failed: {}", label, e)))
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Panel session: {} -> {}", self.state.name(), next.name());
        self.state = next;
    }
}

fn check_status(response: reqwest::Response, label: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(Error::network(format!(
            "{} returned HTTP {}",
            label,
            response.status()
        )))
    }
}

#[async_trait]
impl PanelSession for TophostPanel {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        if self.state != SessionState::Anonymous {
            return Err(Error::auth(format!(
                "login requested in state {}",
                self.state.name()
            )));
        }

        let dns = self.endpoints.dns.clone();
        self.get(&dns, "GET /dns (initial)").await?;
        let session_cookie = self.required_cookie(SESSION_COOKIE, "GET /dns")?;
        self.transition(SessionState::SessionEstablished { session_cookie });

        let login = self.endpoints.login.clone();
        let response = self
            .post_form(
                &login,
                &[
                    ("user", credentials.username.as_str()),
                    ("pass", credentials.password.as_str()),
                ],
                "POST /x-login",
            )
            .await?;
        check_status(response, "POST /x-login")?;
        self.transition(SessionState::AuthenticatedPending);

        let status = self.endpoints.status.clone();
        self.get(&status, "GET /x-httpsstatus").await?;
        let node_cookie = self.required_cookie(NODE_COOKIE, "GET /x-httpsstatus")?;
        self.transition(SessionState::Authenticated { node_cookie });

        info!("Logged in to panel as {}", credentials.username);
        Ok(())
    }

    async fn fetch_record_table(&mut self) -> Result<RecordTable> {
        if !self.state.is_authenticated() {
            return Err(Error::auth(format!(
                "record table requested in state {}",
                self.state.name()
            )));
        }

        let dns = self.endpoints.dns.clone();
        let html = self
            .get(&dns, "GET /dns (authenticated)")
            .await?
            .text()
            .await
            .map_err(|e| Error::network(format!("reading DNS page failed: {}", e)))?;

        let table = parse_record_table(&html);
        if table.is_empty() {
            warn!("DNS page contains no record cells");
        }
        info!("Loaded {} record(s) from panel", table.len());

        self.transition(SessionState::RecordsLoaded { rows: table.len() });
        Ok(table)
    }

    async fn submit_update(
        &mut self,
        record_id: &str,
        new_value: &str,
        previous_value: Option<&str>,
    ) -> Result<String> {
        if !self.state.is_authenticated() {
            return Err(Error::auth(format!(
                "update requested in state {}",
                self.state.name()
            )));
        }

        let mut form = vec![("record", record_id), ("value", new_value)];
        if let Some(previous) = previous_value {
            form.push(("valueo", previous));
        }

        let mutation = self.endpoints.mutation.clone();
        let response = self
            .post_form(&mutation, &form, &format!("POST /x-dns-mod ({})", record_id))
            .await?;

        if !response.status().is_success() {
            warn!(
                "Mutation for record {} returned HTTP {}",
                record_id,
                response.status()
            );
        }

        response
            .text()
            .await
            .map_err(|e| Error::network(format!("reading mutation response failed: {}", e)))
    }

    fn panel_name(&self) -> &'static str {
        "tophost"
    }
}
