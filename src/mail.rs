use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(String),

    #[error("Failed to compose message: {0}")]
    Compose(String),

    #[error("Failed to deliver message: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Outbound mail seam. SMTP in production, a capturing mock in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from_address: String,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let mut builder = SmtpTransport::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let builder = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::Address(self.from_address.clone()))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|_| MailError::Address(message.to.clone()))?)
            .subject(message.subject);

        let email = match message.html {
            Some(html) => builder
                .multipart(MultiPart::alternative_plain_html(message.text, html)),
            None => builder
                .singlepart(SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(message.text)),
        }
        .map_err(|e| MailError::Compose(e.to_string()))?;

        let transport = self.transport.clone();
        // lettre's sync transport blocks on the SMTP round trip
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Test double that records every message instead of delivering it.
#[derive(Default, Clone)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Make the next send attempt fail, for delivery-error paths.
    pub fn fail_next(&self) {
        if let Ok(mut flag) = self.fail_next.lock() {
            *flag = true;
        }
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if let Ok(mut flag) = self.fail_next.lock() {
            if *flag {
                *flag = false;
                return Err(MailError::Delivery("simulated outage".to_string()));
            }
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}
