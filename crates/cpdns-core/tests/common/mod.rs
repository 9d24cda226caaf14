//! Test doubles and common utilities for engine contract tests
//!
//! The doubles record every call so tests can assert on the exact requests
//! the engine would have sent, without any network access.

#![allow(dead_code)]

use cpdns_core::error::{Error, Result};
use cpdns_core::traits::{Credentials, DnsLookup, IpSource, MailMessage, Notifier, PanelSession};
use cpdns_core::types::{PanelRecord, RecordSpec, RecordTable};
use cpdns_core::{Engine, MailConfig, Pacer, RunConfig};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DOMAIN: &str = "example.it";

/// IP source returning a fixed reply and counting calls
pub struct StaticIpSource {
    reply: Result<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn ok(ip: &str) -> Self {
        Self {
            reply: Ok(ip.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(Error::network("connection refused")),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// DNS lookup answering from a map; unknown names time out
#[derive(Default)]
pub struct MapLookup {
    answers: HashMap<String, Vec<String>>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl MapLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `<label>.example.it` with `ips`
    pub fn answer(mut self, label: &str, ips: &[&str]) -> Self {
        self.answers.insert(
            format!("{}.{}", label, DOMAIN),
            ips.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn queried(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queried)
    }
}

#[async_trait::async_trait]
impl DnsLookup for MapLookup {
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<String>> {
        self.queried.lock().unwrap().push(fqdn.to_string());
        self.answers
            .get(fqdn)
            .cloned()
            .ok_or_else(|| Error::network(format!("timeout resolving {}", fqdn)))
    }

    fn nameservers(&self) -> Vec<String> {
        vec!["192.0.2.53".to_string()]
    }
}

/// Everything a [`FakePanel`] was asked to do
#[derive(Debug, Default)]
pub struct PanelLog {
    pub logins: usize,
    pub table_loads: usize,
    /// `(record_id, new_value, previous_value)` per submitted mutation
    pub submissions: Vec<(String, String, Option<String>)>,
}

/// Panel session serving a canned table and scripted mutation replies
pub struct FakePanel {
    table: RecordTable,
    replies: VecDeque<Result<String>>,
    login_error: Option<Error>,
    table_error: Option<Error>,
    log: Arc<Mutex<PanelLog>>,
}

impl FakePanel {
    pub fn new(rows: &[(&str, &str, &str)]) -> Self {
        let records = rows
            .iter()
            .map(|(id, name, value)| PanelRecord {
                id: id.to_string(),
                name: name.to_string(),
                current_value: Some(value.to_string()),
            })
            .collect();

        Self {
            table: RecordTable::new(records),
            replies: VecDeque::new(),
            login_error: None,
            table_error: None,
            log: Arc::new(Mutex::new(PanelLog::default())),
        }
    }

    /// Queue the body returned by the next `submit_update`
    pub fn reply(mut self, body: &str) -> Self {
        self.replies.push_back(Ok(body.to_string()));
        self
    }

    /// Queue a transport failure for the next `submit_update`
    pub fn reply_error(mut self, error: Error) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    pub fn failing_login(mut self, error: Error) -> Self {
        self.login_error = Some(error);
        self
    }

    pub fn failing_table(mut self, error: Error) -> Self {
        self.table_error = Some(error);
        self
    }

    pub fn log(&self) -> Arc<Mutex<PanelLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait::async_trait]
impl PanelSession for FakePanel {
    async fn login(&mut self, _credentials: &Credentials) -> Result<()> {
        self.log.lock().unwrap().logins += 1;
        match self.login_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn fetch_record_table(&mut self) -> Result<RecordTable> {
        self.log.lock().unwrap().table_loads += 1;
        match self.table_error.clone() {
            Some(e) => Err(e),
            None => Ok(self.table.clone()),
        }
    }

    async fn submit_update(
        &mut self,
        record_id: &str,
        new_value: &str,
        previous_value: Option<&str>,
    ) -> Result<String> {
        self.log.lock().unwrap().submissions.push((
            record_id.to_string(),
            new_value.to_string(),
            previous_value.map(str::to_string),
        ));
        self.replies
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"msg":"Record aggiornato"}"#.to_string()))
    }

    fn panel_name(&self) -> &'static str {
        "fake"
    }
}

/// Notifier collecting messages
#[derive(Default)]
pub struct CollectingNotifier {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    fail: bool,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Arc<Mutex<Vec<MailMessage>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait::async_trait]
impl Notifier for CollectingNotifier {
    async fn notify(&self, message: &MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            Err(Error::notify("smtp unavailable"))
        } else {
            Ok(())
        }
    }
}

/// Minimal valid configuration managing `records` under example.it
pub fn minimal_config(records: &[&str]) -> RunConfig {
    RunConfig::new(
        Credentials::new(DOMAIN, "secret"),
        records.iter().map(|r| RecordSpec::new(*r)).collect(),
    )
}

pub fn mail_config() -> MailConfig {
    MailConfig {
        smtp_server: "smtp.example.it".to_string(),
        smtp_port: 587,
        smtp_user: "mailer".to_string(),
        smtp_password: "pw".to_string(),
        from: "ddns@example.it".to_string(),
        to: "ops@example.it".to_string(),
    }
}

/// Engine with an unthrottled pacer
pub fn engine(
    config: RunConfig,
    ip_source: StaticIpSource,
    lookup: MapLookup,
    panel: FakePanel,
) -> Engine {
    paced_engine(config, ip_source, lookup, panel, Pacer::unthrottled())
}

/// Engine with the given pacer
pub fn paced_engine(
    config: RunConfig,
    ip_source: StaticIpSource,
    lookup: MapLookup,
    panel: FakePanel,
    pacer: Pacer,
) -> Engine {
    Engine::new(
        config,
        Box::new(ip_source),
        Box::new(lookup),
        Box::new(panel),
        pacer,
    )
    .expect("engine construction succeeds")
}
