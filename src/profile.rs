// src/profile.rs
//! User preference profile: identity, tiered interest keywords, and the
//! content rules (threshold / always-include / per-section cap) that drive
//! curation policy. Loaded once per run and passed explicitly; no globals.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// --- env defaults & names ---
pub const DEFAULT_PROFILE_PATH: &str = "config/profile.toml";

pub const ENV_PROFILE_PATH: &str = "DIGEST_PROFILE_PATH";
pub const ENV_THRESHOLD: &str = "DIGEST_THRESHOLD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: UserIdentity,
    pub interests: Interests,
    pub content_rules: ContentRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interests {
    pub high_priority: Vec<String>,
    pub medium_priority: Vec<String>,
    pub low_priority: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRules {
    pub min_relevance_threshold: f32,
    pub always_include_sources: Vec<String>,
    pub max_items_per_section: usize,
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f32> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}

impl UserProfile {
    /// Load from a TOML file. Uses DIGEST_PROFILE_PATH or defaults to
    /// "config/profile.toml". DIGEST_THRESHOLD overrides the configured
    /// relevance threshold.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_PROFILE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROFILE_PATH));
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading user profile from {}", path.display()))?;
        let mut profile = Self::from_toml_str(&content)?;

        if let Some(t) = parse_threshold_env(std::env::var(ENV_THRESHOLD).ok()) {
            profile.content_rules.min_relevance_threshold = t;
        }

        Ok(profile)
    }

    /// Load from a TOML string. Missing required keys are an error; the
    /// threshold is hardened into <0.0..=1.0>.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut profile: UserProfile =
            toml::from_str(toml_str).context("parsing user profile")?;

        let t = profile.content_rules.min_relevance_threshold;
        if !t.is_finite() {
            bail!("min_relevance_threshold must be a number in [0, 1]");
        }
        profile.content_rules.min_relevance_threshold = t.clamp(0.0, 1.0);

        if profile.content_rules.max_items_per_section == 0 {
            bail!("max_items_per_section must be at least 1");
        }

        Ok(profile)
    }

    pub fn is_always_included(&self, source_key: &str) -> bool {
        self.content_rules
            .always_include_sources
            .iter()
            .any(|k| k == source_key)
    }
}
