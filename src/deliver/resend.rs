// src/deliver/resend.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{ENV_FROM, ENV_TO};

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_FROM: &str = "Daily Digest <onboarding@resend.dev>";

pub const ENV_RESEND_API_KEY: &str = "RESEND_API_KEY";

#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    to: String,
    timeout: Duration,
    max_retries: u8,
}

impl ResendMailer {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(ENV_RESEND_API_KEY).context("RESEND_API_KEY missing")?;
        let from = std::env::var(ENV_FROM).unwrap_or_else(|_| DEFAULT_FROM.to_string());
        let to = std::env::var(ENV_TO).context("DIGEST_TO missing")?;
        Ok(Self {
            client: Client::new(),
            api_key,
            from,
            to,
            timeout: Duration::from_secs(15),
            max_retries: 3,
        })
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    pub async fn send(&self, subject: &str, html: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Payload<'a> {
            from: &'a str,
            to: Vec<&'a str>,
            subject: &'a str,
            html: &'a str,
        }

        let payload = Payload {
            from: &self.from,
            to: vec![&self.to],
            subject,
            html,
        };

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(RESEND_API_URL)
                .bearer_auth(&self.api_key)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("Resend HTTP error: {e}"));
                    }
                    tracing::info!(status = %rsp.status(), "email sent via Resend");
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("Resend request failed: {e}"));
                }
            }
        }
    }
}
