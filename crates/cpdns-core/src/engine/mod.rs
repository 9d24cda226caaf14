//! Reconciliation engine
//!
//! The [`Engine`] runs one reconciliation pass from start to finish:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  IpSource    │──▶│  DnsLookup   │──▶│   planner    │
//! │ (desired IP) │   │ (per record) │   │  (pure)      │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │ plan non-empty
//!                                              ▼
//!                    ┌──────────────┐   ┌──────────────┐
//!                    │   executor   │◀──│ PanelSession │
//!                    │ (per plan)   │   │ login + table│
//!                    └──────┬───────┘   └──────────────┘
//!                           ▼
//!                    ┌──────────────┐
//!                    │   Notifier   │
//!                    └──────────────┘
//! ```
//!
//! ## Failure policy
//!
//! - IP discovery failure: fatal, [`Stage::IpDiscovery`]
//! - Panel login or table load failure: fatal, [`Stage::Session`]
//! - DNS query failure, missing panel row, rejected or unparseable mutation:
//!   recorded for that record, the run continues
//!
//! Fatal aborts carry the transcript collected so far.

pub mod desired;
pub mod executor;
pub mod planner;
pub mod verify;

use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::pacer::Pacer;
use crate::report::Report;
use crate::traits::{DnsLookup, IpSource, MailMessage, Notifier, PanelSession};
use crate::types::{
    DesiredState, RecordPlan, ResolutionResult, ResolutionStatus, UpdateResult,
};

pub use desired::resolve_desired_ip;
pub use executor::{apply_plan, interpret_response};
pub use planner::{plan, skip_reason, SkipReason};
pub use verify::classify;

/// Stage at which a run was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The desired IP could not be determined
    IpDiscovery,
    /// The panel session could not be established or the table not loaded
    Session,
}

/// A run that hit a fatal error
#[derive(Debug)]
pub struct RunAborted {
    pub stage: Stage,
    pub error: Error,
    /// Transcript up to and including the failure
    pub report: Report,
}

impl std::fmt::Display for RunAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run aborted during {:?}: {}", self.stage, self.error)
    }
}

impl std::error::Error for RunAborted {}

/// A run that completed
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub desired: DesiredState,
    pub resolutions: Vec<ResolutionResult>,
    pub plan: Vec<RecordPlan>,
    /// Empty in resolve-only mode or when nothing had to change
    pub updates: Vec<UpdateResult>,
    pub report: Report,
    /// Whether the notifier was invoked (successfully or not)
    pub notified: bool,
}

impl RunOutcome {
    /// Results with the given status
    pub fn with_status(&self, status: ResolutionStatus) -> impl Iterator<Item = &ResolutionResult> {
        self.resolutions.iter().filter(move |r| r.status == status)
    }

    /// Number of failed mutations
    pub fn failed_updates(&self) -> usize {
        self.updates.iter().filter(|u| !u.success).count()
    }
}

/// One-shot reconciliation engine
///
/// Owns its collaborators for the duration of a run. All outbound requests
/// issued by the engine itself (IP discovery, DNS queries) go through the
/// shared [`Pacer`]; the panel session is expected to hold a clone of the
/// same pacer.
pub struct Engine {
    config: RunConfig,
    ip_source: Box<dyn IpSource>,
    lookup: Box<dyn DnsLookup>,
    panel: Box<dyn PanelSession>,
    notifier: Option<Box<dyn Notifier>>,
    pacer: Pacer,
}

impl Engine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)` if `config` does not validate
    pub fn new(
        config: RunConfig,
        ip_source: Box<dyn IpSource>,
        lookup: Box<dyn DnsLookup>,
        panel: Box<dyn PanelSession>,
        pacer: Pacer,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            ip_source,
            lookup,
            panel,
            notifier: None,
            pacer,
        })
    }

    /// Attach a notifier
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one reconciliation pass
    pub async fn run(&mut self) -> std::result::Result<RunOutcome, RunAborted> {
        let mut report = Report::new();

        if self.config.ip_override.is_none() {
            report.info(format!(
                "Detecting public IP via {}...",
                self.ip_source.source_name()
            ));
        }

        let desired = match resolve_desired_ip(
            self.config.ip_override.as_deref(),
            self.ip_source.as_ref(),
            &self.pacer,
        )
        .await
        {
            Ok(desired) => desired,
            Err(e) => {
                error!(kind = e.kind(), "Public IP discovery failed: {}", e);
                report.error(format!("Public IP discovery failed: {}", e));
                return Err(RunAborted {
                    stage: Stage::IpDiscovery,
                    error: e,
                    report,
                });
            }
        };

        info!("Desired IP: {}", desired.ip);
        report.info(format!("Desired IP: {}", desired.ip));

        let resolutions = self.verify_all(&desired, &mut report).await;
        let plan = plan(&resolutions);

        let mut outcome = RunOutcome {
            desired,
            resolutions,
            plan,
            updates: Vec::new(),
            report,
            notified: false,
        };

        if self.config.resolve_only {
            info!("Resolve-only mode, {} record(s) would change", outcome.plan.len());
            outcome
                .report
                .info("Resolution completed (resolve-only mode). No changes made.");
            self.notify_if_needed(&mut outcome).await;
            return Ok(outcome);
        }

        if outcome.plan.is_empty() {
            info!("All records up to date");
            outcome
                .report
                .ok("All records are already up to date. No changes needed.");
            self.notify_if_needed(&mut outcome).await;
            return Ok(outcome);
        }

        let planned: Vec<&str> = outcome.plan.iter().map(|p| p.record.name.as_str()).collect();
        outcome
            .report
            .info(format!("Records to update: [{}]", planned.join(", ")));

        if let Err(e) = self.panel.login(&self.config.credentials).await {
            return Err(self.abort_session("Panel login failed", e, outcome.report));
        }

        let table = match self.panel.fetch_record_table().await {
            Ok(table) => table,
            Err(e) => {
                return Err(self.abort_session("Loading the record table failed", e, outcome.report));
            }
        };
        debug!("Panel table has {} row(s)", table.len());

        outcome.updates = apply_plan(
            &outcome.plan,
            &table,
            &outcome.desired,
            self.panel.as_mut(),
            &mut outcome.report,
        )
        .await;

        let failed = outcome.failed_updates();
        if failed > 0 {
            warn!("{} of {} update(s) failed", failed, outcome.updates.len());
        } else {
            info!("{} update(s) applied", outcome.updates.len());
        }

        self.notify_if_needed(&mut outcome).await;
        Ok(outcome)
    }

    /// Classify every configured record, pacing each query
    async fn verify_all(
        &self,
        desired: &DesiredState,
        report: &mut Report,
    ) -> Vec<ResolutionResult> {
        let mut results = Vec::with_capacity(self.config.records.len());
        report.info(format!(
            "Querying nameservers: {}",
            self.lookup.nameservers().join(", ")
        ));

        for record in &self.config.records {
            let fqdn = record.fqdn(&self.config.domain);
            self.pacer.wait(&format!("DNS A {}", fqdn)).await;

            let result =
                classify(record, &self.config.domain, &desired.ip, self.lookup.as_ref()).await;

            let answers = result
                .resolved_ips
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");

            match result.status {
                ResolutionStatus::Confirmed => {
                    report.ok(format!("{} -> [{}] (OK)", fqdn, answers));
                }
                ResolutionStatus::Mismatched => {
                    report.error(format!("{} -> [{}] (missing {})", fqdn, answers, desired.ip));
                }
                ResolutionStatus::Unresolved => {
                    report.error(format!(
                        "DNS resolution failed for {}: {}",
                        fqdn,
                        result.error.as_deref().unwrap_or("unknown error")
                    ));
                }
            }

            match skip_reason(&result) {
                Some(reason @ SkipReason::DnsError) => {
                    report.warn(format!("Skipping {}: {}", record, reason));
                }
                Some(reason @ SkipReason::AlreadyUpdated) => {
                    report.info(format!("Skipping {}: {}", record, reason));
                }
                None => {}
            }

            results.push(result);
        }

        results
    }

    fn abort_session(&self, what: &str, error: Error, mut report: Report) -> RunAborted {
        error!(
            kind = error.kind(),
            "{} on {}: {}",
            what,
            self.panel.panel_name(),
            error
        );
        report.error(format!("{}: {}", what, error));
        RunAborted {
            stage: Stage::Session,
            error,
            report,
        }
    }

    /// Notify when mail is configured and either the policy forces it or
    /// at least one record was planned
    async fn notify_if_needed(&self, outcome: &mut RunOutcome) {
        let Some(mail) = &self.config.mail else {
            return;
        };
        if !(self.config.always_notify || !outcome.plan.is_empty()) {
            debug!("Nothing planned, notification not required");
            return;
        }
        let Some(notifier) = &self.notifier else {
            warn!("Mail is configured but no notifier is attached");
            return;
        };

        let message = MailMessage::compose(
            mail,
            self.config.notification_subject(),
            outcome.report.render(),
        );

        outcome.notified = true;
        match notifier.notify(&message).await {
            Ok(()) => {
                info!("Notification sent to {}", message.to);
                outcome.report.ok("Notification sent successfully.");
            }
            Err(e) => {
                error!("Notification failed: {}", e);
                outcome.report.error(format!("Notification failed: {}", e));
            }
        }
    }
}
