//! Collaborator seams of the reconciliation engine
//!
//! - [`IpSource`]: public IP discovery
//! - [`DnsLookup`]: A record queries against explicit nameservers
//! - [`PanelSession`]: authenticated control-panel session
//! - [`Notifier`]: delivery of the run transcript

pub mod dns_lookup;
pub mod ip_source;
pub mod notifier;
pub mod panel;

pub use dns_lookup::DnsLookup;
pub use ip_source::IpSource;
pub use notifier::{MailMessage, Notifier};
pub use panel::{Credentials, PanelSession};
