//! Configuration types for cpdns
//!
//! Two layers:
//! - [`FileConfig`]: the on-disk TOML model (`[general]`, `[a]`, `[mail]`)
//! - [`RunConfig`]: the validated, immutable configuration of one run,
//!   built either from a file or from command-line positionals

use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::traits::Credentials;
use crate::types::RecordSpec;

/// Nameservers queried when none are configured
pub const DEFAULT_NAMESERVERS: &[&str] = &["217.64.201.170", "95.174.18.147"];

/// Control panel base URL
pub const DEFAULT_PANEL_URL: &str = "https://cp.tophost.it";

/// Public IP-echo endpoint
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org";

/// Lower bound for the spacing between outbound requests
pub const MIN_REQUEST_DELAY_MS: u64 = 500;

/// On-disk configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub general: GeneralSection,

    /// A records to manage
    pub a: RecordsSection,

    /// Optional notification settings
    #[serde(default)]
    pub mail: Option<MailConfig>,
}

impl FileConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

/// `[general]` section
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralSection {
    /// Panel username; also the managed domain unless `domain` is set
    pub username: String,

    pub password: String,

    /// Comma-separated nameserver addresses
    #[serde(default)]
    pub custom_dns: Option<String>,

    /// Managed domain, defaults to `username`
    #[serde(default)]
    pub domain: Option<String>,

    /// Notify even when nothing had to change
    #[serde(default)]
    pub always_mail: bool,

    /// Minimum delay between outbound requests in milliseconds
    #[serde(default)]
    pub request_delay_ms: Option<u64>,

    #[serde(default)]
    pub panel_url: Option<String>,

    #[serde(default)]
    pub ip_echo_url: Option<String>,
}

/// `[a]` section
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsSection {
    /// Comma-separated record labels
    pub records: String,
}

/// `[mail]` section
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct MailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub from: String,
    pub to: String,
}

// Keeps the SMTP password out of logs
impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"<REDACTED>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Validated configuration of a single run
///
/// Immutable once the engine is built; every component reads from it instead
/// of consulting process-wide flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Domain the record labels belong to
    pub domain: String,

    pub credentials: Credentials,

    /// Records to reconcile, in processing order
    pub records: Vec<RecordSpec>,

    /// Nameservers used for verification
    pub nameservers: Vec<IpAddr>,

    /// Desired IP supplied by the operator, skips discovery
    pub ip_override: Option<String>,

    /// Classify and report only, never touch the panel
    pub resolve_only: bool,

    /// Suppress console echo of the report
    pub quiet: bool,

    /// Notify even when no record was planned
    pub always_notify: bool,

    /// Minimum spacing between outbound requests
    pub request_delay: Duration,

    pub panel_url: String,

    pub ip_echo_url: String,

    pub mail: Option<MailConfig>,
}

impl RunConfig {
    /// Create a configuration with defaults for everything but the essentials
    ///
    /// The domain defaults to the username, as on the panel each account
    /// manages exactly one domain named after it.
    pub fn new(credentials: Credentials, records: Vec<RecordSpec>) -> Self {
        Self {
            domain: credentials.username.clone(),
            credentials,
            records,
            nameservers: default_nameservers(),
            ip_override: None,
            resolve_only: false,
            quiet: false,
            always_notify: false,
            request_delay: Duration::from_millis(MIN_REQUEST_DELAY_MS),
            panel_url: DEFAULT_PANEL_URL.to_string(),
            ip_echo_url: DEFAULT_IP_ECHO_URL.to_string(),
            mail: None,
        }
    }

    /// Build from command-line positionals (`username password records`)
    pub fn from_positionals(username: &str, password: &str, records: &str) -> Result<Self> {
        let config = Self::new(Credentials::new(username, password), parse_records(records));
        config.validate()?;
        Ok(config)
    }

    /// Build from a parsed configuration file
    pub fn from_file(file: FileConfig) -> Result<Self> {
        let general = file.general;

        let nameservers = match general.custom_dns.as_deref() {
            Some(list) => parse_nameservers(list)?,
            None => default_nameservers(),
        };

        let mut config = Self::new(
            Credentials::new(general.username, general.password),
            parse_records(&file.a.records),
        );

        if let Some(domain) = general.domain.filter(|d| !d.trim().is_empty()) {
            config.domain = domain.trim().to_string();
        }
        config.nameservers = nameservers;
        config.always_notify = general.always_mail;
        if let Some(ms) = general.request_delay_ms {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Some(url) = general.panel_url {
            config.panel_url = url;
        }
        if let Some(url) = general.ip_echo_url {
            config.ip_echo_url = url;
        }
        config.mail = file.mail;

        config.validate()?;
        Ok(config)
    }

    /// Set the desired IP override
    pub fn with_ip_override(mut self, ip: Option<String>) -> Self {
        self.ip_override = ip;
        self
    }

    /// Enable or disable resolve-only mode
    pub fn with_resolve_only(mut self, resolve_only: bool) -> Self {
        self.resolve_only = resolve_only;
        self
    }

    /// Enable or disable console echo suppression
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Force notification regardless of the plan (OR-ed with the file setting)
    pub fn with_always_notify(mut self, always: bool) -> Self {
        self.always_notify |= always;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.credentials.username.trim().is_empty() {
            return Err(Error::config("username cannot be empty"));
        }
        if self.credentials.password.is_empty() {
            return Err(Error::config("password cannot be empty"));
        }
        if self.domain.trim().is_empty() {
            return Err(Error::config("domain cannot be empty"));
        }
        if self.records.is_empty() {
            return Err(Error::config("no records configured"));
        }
        if self.nameservers.is_empty() {
            return Err(Error::config("at least one nameserver is required"));
        }
        if self.request_delay < Duration::from_millis(MIN_REQUEST_DELAY_MS) {
            return Err(Error::config(format!(
                "request delay must be at least {}ms, got {}ms",
                MIN_REQUEST_DELAY_MS,
                self.request_delay.as_millis()
            )));
        }
        if !self.panel_url.starts_with("https://") && !self.panel_url.starts_with("http://") {
            return Err(Error::config(format!(
                "panel URL must use HTTP or HTTPS: {}",
                self.panel_url
            )));
        }
        if self.ip_override.is_none()
            && !self.ip_echo_url.starts_with("https://")
            && !self.ip_echo_url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "IP echo URL must use HTTP or HTTPS: {}",
                self.ip_echo_url
            )));
        }
        if let Some(mail) = &self.mail {
            if mail.smtp_server.is_empty() || mail.from.is_empty() || mail.to.is_empty() {
                return Err(Error::config(
                    "mail section requires smtp_server, from and to",
                ));
            }
        }

        Ok(())
    }

    /// Subject line of the run notification
    pub fn notification_subject(&self) -> String {
        format!("DNS record update: domain {}", self.domain)
    }
}

/// Split a comma-separated list, trimming items and dropping empty ones
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_records(list: &str) -> Vec<RecordSpec> {
    split_list(list).into_iter().map(RecordSpec::new).collect()
}

fn parse_nameservers(list: &str) -> Result<Vec<IpAddr>> {
    split_list(list)
        .iter()
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|_| Error::config(format!("invalid nameserver address: {}", s)))
        })
        .collect()
}

fn default_nameservers() -> Vec<IpAddr> {
    DEFAULT_NAMESERVERS
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}
