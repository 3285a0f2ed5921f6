//! Configuration for planner thresholds and storage.
//!
//! Load order: `.kdg/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level KDG configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KdgConfig {
    pub planner: PlannerConfig,
    pub storage: StorageConfig,
}

/// Planner and diagnostics thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Confidence at or above this counts as "known". Range (0, 1].
    pub mastery_threshold: f64,
    /// Days since last review before a concept is flagged for review.
    pub review_interval_days: i64,
    /// Nominal study hours for a complexity-0 concept, before the
    /// complexity multiplier and confidence discount.
    pub base_hours: f64,
    /// Maximum concepts returned by next-concept recommendation.
    pub recommend_limit: usize,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for graph, profile, and progress files.
    pub data_dir: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 0.7,
            review_interval_days: 7,
            base_hours: 0.5,
            recommend_limit: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ".kdg".to_string(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl KdgConfig {
    /// Load config from `.kdg/config.toml` under the given root, with env
    /// var overrides. Falls back to defaults if no config file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(".kdg").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("KDG_MASTERY_THRESHOLD", &mut config.planner.mastery_threshold);
        env_override(
            "KDG_REVIEW_INTERVAL_DAYS",
            &mut config.planner.review_interval_days,
        );
        env_override("KDG_BASE_HOURS", &mut config.planner.base_hours);
        env_override("KDG_RECOMMEND_LIMIT", &mut config.planner.recommend_limit);

        if config.planner.mastery_threshold <= 0.0 || config.planner.mastery_threshold > 1.0 {
            anyhow::bail!(
                "mastery_threshold ({}) must be in (0, 1]",
                config.planner.mastery_threshold
            );
        }
        if config.planner.base_hours <= 0.0 {
            anyhow::bail!("base_hours ({}) must be positive", config.planner.base_hours);
        }

        Ok(config)
    }
}
