// src/deliver/mod.rs
//! Outbound delivery of the rendered digest. Two transports: the Resend HTTP
//! API (default) and plain SMTP, selected by DIGEST_TRANSPORT.

pub mod resend;
pub mod smtp;

pub use resend::ResendMailer;
pub use smtp::SmtpMailer;

use anyhow::{bail, Result};

pub const ENV_TRANSPORT: &str = "DIGEST_TRANSPORT";
pub const ENV_FROM: &str = "DIGEST_FROM";
pub const ENV_TO: &str = "DIGEST_TO";

pub enum Mailer {
    Resend(ResendMailer),
    Smtp(SmtpMailer),
}

impl Mailer {
    /// Build the transport selected by DIGEST_TRANSPORT ("resend" when
    /// unset). Missing credentials for the selected transport are a startup
    /// error.
    pub fn from_env() -> Result<Self> {
        let transport = std::env::var(ENV_TRANSPORT)
            .unwrap_or_else(|_| "resend".to_string())
            .to_ascii_lowercase();
        match transport.as_str() {
            "resend" => Ok(Self::Resend(ResendMailer::from_env()?)),
            "smtp" => Ok(Self::Smtp(SmtpMailer::from_env()?)),
            other => bail!("unsupported DIGEST_TRANSPORT: {other}"),
        }
    }

    pub async fn send(&self, subject: &str, html: &str) -> Result<()> {
        match self {
            Self::Resend(m) => m.send(subject, html).await,
            Self::Smtp(m) => m.send(subject, html).await,
        }
    }
}
