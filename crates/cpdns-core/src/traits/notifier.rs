// # Notifier Trait
//
// Delivery of the run transcript to an operator. The engine decides *whether*
// to notify; implementations only deliver.

use async_trait::async_trait;

use crate::config::MailConfig;

/// A composed notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Compose a message addressed according to `mail`
    pub fn compose(mail: &MailConfig, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: mail.from.clone(),
            to: mail.to.clone(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Trait for notification delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    ///
    /// Errors are reported in the transcript and never change the run outcome.
    async fn notify(&self, message: &MailMessage) -> Result<(), crate::Error>;
}
