//! Outgoing mail over SMTP
//!
//! Each send authenticates as the rotating sender account, so the mailer
//! keeps only the relay settings and builds a transport per account.

use crate::config::SmtpConfig;
use crate::error::{CampaignError, Result};
use async_trait::async_trait;
use campaign_types::SenderAccount;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// A rendered message ready to hand to a [`Mailer`]
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `email` authenticated as `account`
    async fn send(&self, account: &SenderAccount, email: &OutgoingEmail) -> Result<()>;
}

/// STARTTLS relay mailer backed by lettre
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    timeout: Duration,
    display_name: String,
    reply_to: Option<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        if config.host.is_empty() {
            return Err(CampaignError::Config("SMTP_SERVER is required".to_string()));
        }

        let reply_to = config
            .reply_to
            .as_deref()
            .map(|address| {
                address.parse::<Mailbox>().map_err(|e| {
                    CampaignError::Config(format!("Invalid REPLY_TO_EMAIL '{}': {}", address, e))
                })
            })
            .transpose()?;

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            timeout: Duration::from_secs(config.timeout_seconds),
            display_name: config.sender_display_name.clone(),
            reply_to,
        })
    }

    fn transport_for(&self, account: &SenderAccount) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| CampaignError::Mail(format!("SMTP relay setup failed: {}", e)))?
            .port(self.port)
            .timeout(Some(self.timeout))
            .credentials(SmtpCredentials::new(
                account.user.clone(),
                account.password.clone(),
            ))
            .build();

        Ok(transport)
    }

    /// Build the MIME message: a related part wrapping an HTML-only alternative
    pub fn build_message(&self, account: &SenderAccount, email: &OutgoingEmail) -> Result<Message> {
        let address = account
            .user
            .parse::<Address>()
            .map_err(|e| CampaignError::Mail(format!("Invalid sender '{}': {}", account.user, e)))?;
        let from = Mailbox::new(Some(self.display_name.clone()), address);
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| CampaignError::Mail(format!("Invalid recipient '{}': {}", email.to, e)))?;

        let mut builder = Message::builder().from(from).to(to).subject(&email.subject);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        let body = MultiPart::related().multipart(
            MultiPart::alternative().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html_body.clone()),
            ),
        );

        builder
            .multipart(body)
            .map_err(|e| CampaignError::Mail(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, account: &SenderAccount, email: &OutgoingEmail) -> Result<()> {
        let message = self.build_message(account, email)?;
        let transport = self.transport_for(account)?;

        transport
            .send(message)
            .await
            .map_err(|e| CampaignError::Mail(format!("SMTP send via {} failed: {}", account.user, e)))?;

        Ok(())
    }
}
