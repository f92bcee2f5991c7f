//! Configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main test configuration loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub name: String,
    pub description: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub duration_secs: u64,
    pub users: u32,
    #[serde(default)]
    pub seed: Option<u64>, // Optional RNG seed for reproducible tests
    #[serde(default)]
    pub weights: ActionWeights,
    #[serde(default)]
    pub wait: WaitInterval,
    #[serde(default)]
    pub profile: Profile,
    /// OTLP collector endpoint override. When unset the exporter falls back
    /// to OTEL_EXPORTER_OTLP_ENDPOINT / its built-in default.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Relative selection weights for the four workload actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionWeights {
    #[serde(default = "default_get_book_weight")]
    pub get_book: f64,
    #[serde(default = "default_get_many_weight")]
    pub get_many_books: f64,
    #[serde(default = "default_create_weight")]
    pub create_book: f64,
    #[serde(default = "default_delete_weight")]
    pub delete_book: f64,
}

fn default_get_book_weight() -> f64 {
    100.0
}

fn default_get_many_weight() -> f64 {
    1.0
}

fn default_create_weight() -> f64 {
    2.0
}

fn default_delete_weight() -> f64 {
    3.0
}

impl Default for ActionWeights {
    fn default() -> Self {
        Self {
            get_book: default_get_book_weight(),
            get_many_books: default_get_many_weight(),
            create_book: default_create_weight(),
            delete_book: default_delete_weight(),
        }
    }
}

/// Pause between a user's iterations, drawn uniformly from this interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitInterval {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for WaitInterval {
    fn default() -> Self {
        Self {
            min_secs: 1.0,
            max_secs: 5.0,
        }
    }
}

/// Workload profile.
///
/// The traced profile enables span export and lets create_book attach the
/// large hex `extra-data` payload on roughly half of its calls; the plain
/// profile does neither. Two profiles, not a bug to reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Traced,
    #[default]
    Plain,
}

impl Profile {
    /// Whether this profile exports spans and instruments the HTTP client.
    pub fn traced(&self) -> bool {
        matches!(self, Profile::Traced)
    }

    /// Whether create_book may attach the hex `extra-data` payload.
    pub fn may_attach_extra(&self) -> bool {
        matches!(self, Profile::Traced)
    }
}

impl TestConfig {
    /// Load configuration from YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TestConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.duration_secs == 0 {
            anyhow::bail!("duration_secs must be > 0");
        }
        if self.users == 0 {
            anyhow::bail!("users must be > 0");
        }
        if self.wait.min_secs < 0.0 || self.wait.max_secs < self.wait.min_secs {
            anyhow::bail!("wait interval must satisfy 0 <= min_secs <= max_secs");
        }
        let total = self.weights.get_book
            + self.weights.get_many_books
            + self.weights.create_book
            + self.weights.delete_book;
        if !(total > 0.0) {
            anyhow::bail!("action weights must sum to > 0");
        }
        Ok(())
    }
}
