// src/lib.rs
// Public library surface for integration tests (and the digest binary).

pub mod compose;
pub mod curate;
pub mod deliver;
pub mod llm;
pub mod profile;
pub mod render;
pub mod runlog;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::curate::{CurationLog, Curator, ScoredItem, SourceStats, Tier};
pub use crate::llm::{build_client_from_config, DynLlmClient, LlmClient, LlmConfig};
pub use crate::profile::UserProfile;
pub use crate::sources::{FetchOutcome, FetchStatus, SourceCatalog};

/// Today's date in the greeting format used by the email header and the
/// summary prompts, e.g. "Tuesday, August 4, 2026".
pub fn today_str() -> String {
    chrono::Local::now().format("%A, %B %-d, %Y").to_string()
}

/// Today's date as YYYY-MM-DD, used for run-log and dry-run file names.
pub fn today_iso() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
