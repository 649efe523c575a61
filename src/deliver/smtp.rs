// src/deliver/smtp.rs
use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{ENV_FROM, ENV_TO};

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST").context("SMTP_HOST missing")?;
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = std::env::var(ENV_FROM).context("DIGEST_FROM missing")?;
        let to_addr = std::env::var(ENV_TO).context("DIGEST_TO missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid DIGEST_FROM: {e}"))?;
        let to = to_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid DIGEST_TO: {e}"))?;

        Ok(Self { mailer, from, to })
    }

    pub async fn send(&self, subject: &str, html: &str) -> Result<()> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html.to_string())
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        tracing::info!("email sent via SMTP");
        Ok(())
    }
}
