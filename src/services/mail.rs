// src/services/mail.rs
//! Outbound mail
//!
//! `Mailer` is the seam the auth flows send through. Production uses AWS SES
//! or the Resend HTTP API; development logs the message instead.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::Region;
use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::common::config::{MailConfig, MailProvider};
use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail provider not configured: {0}")]
    NotConfigured(String),

    #[error("SES operation failed: {0}")]
    SESError(String),

    #[error("Resend API error: {0}")]
    ResendError(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl MailMessage {
    /// Recipient lower-cased and trimmed, subject trimmed
    pub fn new(to: &str, subject: &str, html: String) -> Self {
        Self {
            to: to.trim().to_lowercase(),
            subject: subject.trim().to_string(),
            html,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;

    fn provider(&self) -> &'static str;
}

/// Builds the mailer selected by `MAIL_PROVIDER`
pub async fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    let mailer: Arc<dyn Mailer> = match config.provider {
        MailProvider::Log => Arc::new(LogMailer),
        MailProvider::Ses => Arc::new(SesMailer::from_config(config).await),
        MailProvider::Resend => Arc::new(ResendMailer::from_config(config)?),
    };
    info!(provider = mailer.provider(), "Mailer initialized");
    Ok(mailer)
}

// ---- Development ----

/// Writes messages to the log; the links in them are clickable from there.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            html = %message.html,
            "Mail not delivered (log provider)"
        );
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "log"
    }
}

// ---- AWS SES ----

pub struct SesMailer {
    client: SesClient,
    from: String,
}

impl SesMailer {
    /// Credentials come from the default AWS provider chain
    pub async fn from_config(config: &MailConfig) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.ses_region.clone()))
            .load()
            .await;

        Self {
            client: SesClient::new(&aws_config),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let destination = Destination::builder()
            .to_addresses(message.to.clone())
            .build();

        let subject_content = Content::builder()
            .data(&message.subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::SESError(format!("Failed to build subject: {}", e)))?;

        let body_content = Content::builder()
            .data(&message.html)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::SESError(format!("Failed to build body: {}", e)))?;

        let ses_message = Message::builder()
            .subject(subject_content)
            .body(SesBody::builder().html(body_content).build())
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&self.from)
            .destination(destination)
            .content(EmailContent::builder().simple(ses_message).build())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, to = %safe_email_log(&message.to), "Failed to send email via SES");
                MailError::SESError(format!("Send failed: {}", e))
            })?;

        info!(
            to = %safe_email_log(&message.to),
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "ses"
    }
}

// ---- Resend ----

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let api_key = config
            .resend_api_key
            .clone()
            .ok_or_else(|| MailError::NotConfigured("RESEND_API_KEY".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let payload = ResendEmail {
            from: &self.from,
            to: vec![message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Resend rejected email");
            return Err(MailError::ResendError(format!("HTTP {}: {}", status, body)));
        }

        info!(to = %safe_email_log(&message.to), "Email sent successfully via Resend");
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "resend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_normalization() {
        let message = MailMessage::new("  User@Example.COM ", " Password reset ", "<p>hi</p>".into());
        assert_eq!(message.to, "user@example.com");
        assert_eq!(message.subject, "Password reset");
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = LogMailer;
        let result = mailer
            .send(MailMessage::new("a@b.co", "Hi", "<p>x</p>".into()))
            .await;
        assert!(result.is_ok());
        assert_eq!(mailer.provider(), "log");
    }

    #[test]
    fn test_resend_requires_key() {
        let config = MailConfig {
            provider: MailProvider::Resend,
            from: "auth@example.com".into(),
            resend_api_key: None,
            ses_region: "us-east-1".into(),
        };
        assert!(matches!(
            ResendMailer::from_config(&config),
            Err(MailError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_resend_payload_shape() {
        let payload = ResendEmail {
            from: "auth@example.com",
            to: vec!["user@example.com"],
            subject: "Email verification",
            html: "<p>x</p>",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"][0], "user@example.com");
        assert_eq!(json["from"], "auth@example.com");
    }
}
