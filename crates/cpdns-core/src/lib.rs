// # cpdns-core
//
// Core library for reconciling control-panel managed DNS records.
//
// ## Architecture Overview
//
// - **IpSource**: discovers the public IP records should point to
// - **DnsLookup**: A record queries against explicit nameservers
// - **PanelSession**: authenticated session against the control panel
// - **Notifier**: delivery of the run transcript
// - **Engine**: one reconciliation pass (verify → plan → update → notify)
//
// ## Design Principles
//
// 1. **Library-First**: the binary is a thin CLI around [`Engine`]
// 2. **Explicit state**: an immutable [`RunConfig`] in, a [`RunOutcome`] with
//    its [`Report`] out; no process-wide flags or buffers
// 3. **Typed failures**: fatal vs. per-record errors are decided by stage,
//    never by inspecting message text
// 4. **Sequential and paced**: one request in flight, spaced by [`Pacer`]

pub mod config;
pub mod engine;
pub mod error;
pub mod pacer;
pub mod report;
pub mod traits;
pub mod types;

pub use config::{FileConfig, MailConfig, RunConfig};
pub use engine::{Engine, RunAborted, RunOutcome, Stage};
pub use error::{Error, Result};
pub use pacer::Pacer;
pub use report::Report;
pub use traits::{Credentials, DnsLookup, IpSource, MailMessage, Notifier, PanelSession};
pub use types::{
    DesiredState, PanelRecord, RecordPlan, RecordSpec, RecordTable, ResolutionResult,
    ResolutionStatus, UpdateResult,
};
