// src/sources/types.rs
use anyhow::Result;
use serde::Serialize;

/// Per-source fetch outcome, recorded for the run log and the email footer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FetchStatus {
    pub chars: usize,
    pub status: FetchOutcome,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchOutcome {
    Ok,
    Failed,
}

/// One content source. `fetch` returns the source's raw text block; an empty
/// string means "nothing available today" and is not an error by itself.
#[async_trait::async_trait]
pub trait FetchSource: Send + Sync {
    async fn fetch(&self) -> Result<String>;
    fn key(&self) -> &str;
}
