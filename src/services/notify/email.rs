use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;

use super::Notifier;
use crate::config::EmailConfig;
use crate::error::NotifyError;
use crate::models::Digest;

/// Sends the digest as a multipart (text + HTML) e-mail over SMTP STARTTLS
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, digest: &Digest) -> Result<Message, NotifyError> {
        let from = parse_mailbox("EMAIL_FROM", &self.config.from)?;
        let to = parse_mailbox("EMAIL_TO", self.config.to.expose())?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(digest.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(digest.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(digest.html.clone()),
                    ),
            )?;
        Ok(message)
    }
}

fn parse_mailbox(setting: &'static str, address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|source| NotifyError::Address { setting, source })
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, digest: &Digest) -> Result<(), NotifyError> {
        let message = self.build_message(digest)?;

        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose().to_string(),
        );
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build();

        mailer.send(message).await?;

        info!("E-mail digest sent ({} items)", digest.item_count);
        Ok(())
    }
}
