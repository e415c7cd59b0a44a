//! SMTP delivery over STARTTLS, CSV attached.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::ReportError;
use crate::config::Settings;

pub struct Mailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
    to: String,
}

impl Mailer {
    /// Build a mailer from settings. Returns None when the mail account is
    /// not configured, so the pipeline can run without email.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let from = settings.email_from.clone()?;
        let password = settings.email_password.clone()?;
        let to = settings.email_to.clone().unwrap_or_else(|| from.clone());
        Some(Self {
            host: settings.smtp_host.clone(),
            port: settings.smtp_port,
            username: from.clone(),
            password,
            from,
            to,
        })
    }

    /// Send one HTML report with a CSV attachment.
    pub fn send(
        &self,
        subject: &str,
        html_body: &str,
        attachment_name: &str,
        attachment_bytes: Vec<u8>,
    ) -> Result<(), ReportError> {
        let from: Mailbox = self.from.parse()?;
        let to: Mailbox = self.to.parse()?;
        let csv_type = ContentType::parse("text/csv")
            .map_err(|e| ReportError::ContentType(e.to_string()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(html_body.to_string()))
                    .singlepart(
                        Attachment::new(attachment_name.to_string())
                            .body(attachment_bytes, csv_type),
                    ),
            )?;

        let transport = SmtpTransport::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .build();

        transport.send(&message)?;
        tracing::info!(to = %self.to, subject = %subject, "Report email sent");
        Ok(())
    }
}
