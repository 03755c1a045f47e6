//! Configuration for the suggestion pipelines
//!
//! Values are passed explicitly into each pipeline entry point; nothing in
//! the core reads ambient state. Loading resolves TOML first, then applies
//! `TAGFUSE_*` environment overrides, then validates ranges.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Ensemble pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Number of inference models to dispatch (1-5)
    pub model_count: usize,
    /// Per-model genre count K: entries kept from each reduced taggram (1-10)
    pub per_model_genre_count: usize,
    /// Minimum normalized weight to keep a tag (0.0-1.0)
    pub min_weight: f32,
    /// Maximum number of suggestions returned
    pub max_results: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            model_count: 3,
            per_model_genre_count: 5,
            min_weight: 0.2,
            max_results: 5,
        }
    }
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.model_count) {
            return Err(Error::Config(format!(
                "model_count must be 1-5, got {}",
                self.model_count
            )));
        }
        if !(1..=10).contains(&self.per_model_genre_count) {
            return Err(Error::Config(format!(
                "per_model_genre_count must be 1-10, got {}",
                self.per_model_genre_count
            )));
        }
        if !(0.0..=1.0).contains(&self.min_weight) {
            return Err(Error::Config(format!(
                "ensemble min_weight must be 0.0-1.0, got {}",
                self.min_weight
            )));
        }
        if self.max_results < 1 {
            return Err(Error::Config(
                "ensemble max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Community pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Minimum annotation count to keep a tag
    ///
    /// This is a raw count threshold on the source's scale, not a [0,1]
    /// confidence.
    pub min_weight: f32,
    /// Maximum number of suggestions returned
    pub max_results: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            min_weight: 60.0,
            max_results: 5,
        }
    }
}

impl CommunityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_weight < 0.0 || !self.min_weight.is_finite() {
            return Err(Error::Config(format!(
                "community min_weight must be a non-negative number, got {}",
                self.min_weight
            )));
        }
        if self.max_results < 1 {
            return Err(Error::Config(
                "community max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for both pipelines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub ensemble: EnsembleConfig,
    pub community: CommunityConfig,
    /// Last.fm API key for the community tag source
    pub lastfm_api_key: Option<String>,
}

impl SuggestionConfig {
    /// Load configuration from a TOML file, apply env overrides, validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)?
        } else {
            info!(path = %path.display(), "No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no env overrides, no validation)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply `TAGFUSE_*` environment variable overrides
    ///
    /// Environment takes priority over TOML values. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        override_from_env("TAGFUSE_MODEL_COUNT", &mut self.ensemble.model_count);
        override_from_env(
            "TAGFUSE_PER_MODEL_GENRE_COUNT",
            &mut self.ensemble.per_model_genre_count,
        );
        override_from_env("TAGFUSE_ENSEMBLE_MIN_WEIGHT", &mut self.ensemble.min_weight);
        override_from_env("TAGFUSE_ENSEMBLE_MAX_RESULTS", &mut self.ensemble.max_results);
        override_from_env("TAGFUSE_COMMUNITY_MIN_WEIGHT", &mut self.community.min_weight);
        override_from_env(
            "TAGFUSE_COMMUNITY_MAX_RESULTS",
            &mut self.community.max_results,
        );

        if let Ok(key) = std::env::var("TAGFUSE_LASTFM_API_KEY") {
            if !key.trim().is_empty() {
                if self.lastfm_api_key.is_some() {
                    warn!("Last.fm API key found in both TOML and environment, using environment");
                }
                self.lastfm_api_key = Some(key);
            }
        }
    }

    /// Validate all value ranges
    pub fn validate(&self) -> Result<()> {
        self.ensemble.validate()?;
        self.community.validate()?;
        Ok(())
    }
}

fn override_from_env<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => {
                info!(var = var, value = %raw, "Applied environment override");
                *target = value;
            }
            Err(_) => {
                warn!(var = var, value = %raw, "Ignoring unparseable environment override");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
