// SMTP notifier wired by the binary.
//
// One STARTTLS session per notification, authenticated with the `[mail]`
// credentials. Nothing is queued or retried: a failed delivery is reported
// by the engine and the run outcome stays the same.

use async_trait::async_trait;
use cpdns_core::traits::{MailMessage, Notifier};
use cpdns_core::{Error, MailConfig, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for the whole SMTP exchange
const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Notifier delivering the report by mail
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    server: String,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("server", &self.server)
            .finish()
    }
}

impl SmtpNotifier {
    /// Build a STARTTLS transport for `mail`
    ///
    /// No connection is made until the first notification.
    pub fn new(mail: &MailConfig) -> Result<Self> {
        Self::with_timeout(mail, DEFAULT_SMTP_TIMEOUT)
    }

    pub fn with_timeout(mail: &MailConfig, timeout: Duration) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_server)
            .map_err(|e| Error::config(format!("invalid SMTP server {}: {}", mail.smtp_server, e)))?
            .port(mail.smtp_port)
            .timeout(Some(timeout));

        if !mail.smtp_user.is_empty() {
            builder = builder.credentials(Credentials::new(
                mail.smtp_user.clone(),
                mail.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            server: format!("{}:{}", mail.smtp_server, mail.smtp_port),
        })
    }
}

/// Plain-text message for `message`
fn build_message(message: &MailMessage) -> Result<Message> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e| Error::notify(format!("invalid sender {}: {}", message.from, e)))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| Error::notify(format!("invalid recipient {}: {}", message.to, e)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| Error::notify(format!("cannot build message: {}", e)))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, message: &MailMessage) -> Result<()> {
        let email = build_message(message)?;
        debug!("Sending notification via {}", self.server);

        self.transport
            .send(email)
            .await
            .map_err(|e| Error::notify(format!("SMTP delivery via {} failed: {}", self.server, e)))?;

        info!("Notification delivered to {}", message.to);
        Ok(())
    }
}
