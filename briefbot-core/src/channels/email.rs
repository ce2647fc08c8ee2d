//! Outbound email via SMTP.
//!
//! Delivers rendered reports as PDF attachments using lettre's async SMTP
//! transport. Message construction is split from delivery so it can be
//! tested without a network.

use crate::adapters::EmailSender;
use crate::error::FlowError;
use crate::types::Report;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Port on which SMTP servers expect implicit TLS rather than STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP account used to send reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Account user name, usually the full email address.
    pub username: String,
    /// Account password; for Gmail this is an app password.
    pub password: String,
    /// Sender address; defaults to `username` when empty.
    #[serde(default)]
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
        }
    }
}

impl EmailConfig {
    pub fn sender_address(&self) -> &str {
        if self.from_address.is_empty() {
            &self.username
        } else {
            &self.from_address
        }
    }
}

/// SMTP implementation of [`EmailSender`] using lettre.
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
        let builder = if self.config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
        }
        .map_err(|e| format!("SMTP relay error: {e}"))?;

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }
}

/// Build the report email: a short plain-text body plus the PDF attachment.
pub fn build_report_message(
    from: &str,
    recipient: &str,
    subject: &str,
    report: &Report,
) -> Result<Message, String> {
    let body = format!(
        "Hi,\n\nAttached is your research summary on \"{}\".\n\nSent by Briefbot.\n",
        report.topic
    );
    let pdf = ContentType::parse("application/pdf")
        .map_err(|e| format!("Invalid content type: {e}"))?;
    let attachment = Attachment::new(report.filename.clone()).body(report.bytes.to_vec(), pdf);

    Message::builder()
        .from(from.parse().map_err(|e| format!("Invalid from address: {e}"))?)
        .to(recipient
            .parse()
            .map_err(|e| format!("Invalid to address: {e}"))?)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body))
                .singlepart(attachment),
        )
        .map_err(|e| format!("Failed to build email: {e}"))
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        attachment: &Report,
    ) -> Result<(), FlowError> {
        let failed = |message: String| FlowError::EmailDeliveryFailed { message };

        let email = build_report_message(self.config.sender_address(), recipient, subject, attachment)
            .map_err(failed)?;
        let mailer = self.transport().map_err(failed)?;

        debug!(host = self.config.smtp_host.as_str(), port = self.config.smtp_port, "Sending report email");
        let response = mailer
            .send(email)
            .await
            .map_err(|e| failed(format!("SMTP send error: {e}")))?;

        info!(code = %response.code(), bytes = attachment.len(), "Report email accepted by SMTP server");
        Ok(())
    }
}
