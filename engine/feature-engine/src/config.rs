//! Configuration for the feature engine

use crate::error::{FeatureError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "FEATURE_";

/// Configuration for the feature pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FeatureConfig {
    /// Consistency metric parameters
    pub consistency: ConsistencyConfig,

    /// Optimized moving average parameters
    pub moving_average: MovingAverageConfig,

    /// Injury risk heuristic parameters
    pub injury: InjuryConfig,

    /// Age curve parameters
    pub age: AgeConfig,

    /// Team context parameters
    pub team_context: TeamContextConfig,

    /// Season recency weights handed to downstream blending
    pub season_weights: SeasonWeights,

    /// Pipeline execution settings
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Games required before consistency metrics are computed
    pub min_games: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageConfig {
    /// Look-back window for the fantasy points average
    pub fantasy_points_lag: usize,

    /// Look-back window for points, rebounds and assists
    pub stat_lag: usize,

    /// Games strictly before this date form the regression training set
    pub train_cutoff: NaiveDate,

    /// Which rebound count feeds the rebounds average
    pub rebound_source: ReboundSource,
}

/// Rebound count used for `optimized_ma_rebounds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReboundSource {
    Offensive,
    Total,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjuryConfig {
    /// Games in a full regular season
    pub expected_games: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeConfig {
    /// Age assumed when a player's last record carries none
    pub default_age: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamContextConfig {
    /// Conference positions that count as contenders
    pub contender_slots: usize,

    /// Flag used when a team/season is missing from the standings
    pub default_contender: bool,
}

/// Season recency weights (e.g. 2025 → 0.40)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonWeights {
    /// Weight for seasons not listed below
    pub fallback: f64,

    pub weights: Vec<SeasonWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonWeight {
    pub season_end_year: i32,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fan per-player work out across the rayon pool
    pub parallel: bool,

    /// Score records that arrive without fantasy points instead of rejecting them
    pub derive_missing_fantasy_points: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self { min_games: 10 }
    }
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self {
            fantasy_points_lag: 20,
            stat_lag: 15,
            train_cutoff: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            rebound_source: ReboundSource::Offensive,
        }
    }
}

impl Default for InjuryConfig {
    fn default() -> Self {
        Self { expected_games: 82 }
    }
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self { default_age: 27.0 }
    }
}

impl Default for TeamContextConfig {
    fn default() -> Self {
        Self { contender_slots: 6, default_contender: true }
    }
}

impl Default for SeasonWeights {
    fn default() -> Self {
        Self {
            fallback: 0.25,
            weights: vec![
                SeasonWeight { season_end_year: 2025, weight: 0.40 },
                SeasonWeight { season_end_year: 2024, weight: 0.30 },
                SeasonWeight { season_end_year: 2023, weight: 0.20 },
                SeasonWeight { season_end_year: 2022, weight: 0.10 },
            ],
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { parallel: true, derive_missing_fantasy_points: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl SeasonWeights {
    /// Recency weight for a season, falling back when the season is not listed
    pub fn weight_for(&self, season_end_year: i32) -> f64 {
        self.weights
            .iter()
            .find(|w| w.season_end_year == season_end_year)
            .map(|w| w.weight)
            .unwrap_or(self.fallback)
    }
}

impl FeatureConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FeatureConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then apply `FEATURE_*` environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (keys are given without the prefix)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MIN_GAMES") {
            self.consistency.min_games = parse_value("MIN_GAMES", &v)?;
        }

        if let Some(v) = lookup("FP_LAG") {
            self.moving_average.fantasy_points_lag = parse_value("FP_LAG", &v)?;
        }

        if let Some(v) = lookup("STAT_LAG") {
            self.moving_average.stat_lag = parse_value("STAT_LAG", &v)?;
        }

        if let Some(v) = lookup("TRAIN_CUTOFF") {
            self.moving_average.train_cutoff = NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|e| FeatureError::InvalidConfig(format!("TRAIN_CUTOFF={v}: {e}")))?;
        }

        if let Some(v) = lookup("EXPECTED_GAMES") {
            self.injury.expected_games = parse_value("EXPECTED_GAMES", &v)?;
        }

        if let Some(v) = lookup("PARALLEL") {
            self.pipeline.parallel = parse_value("PARALLEL", &v)?;
        }

        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v;
        }

        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.consistency.min_games == 0 {
            return Err(FeatureError::InvalidConfig("min_games must be positive".into()));
        }

        if self.moving_average.fantasy_points_lag == 0 || self.moving_average.stat_lag == 0 {
            return Err(FeatureError::InvalidConfig("look-back windows must be positive".into()));
        }

        if self.injury.expected_games == 0 {
            return Err(FeatureError::InvalidConfig("expected_games must be positive".into()));
        }

        if self.team_context.contender_slots == 0 {
            return Err(FeatureError::InvalidConfig("contender_slots must be positive".into()));
        }

        if self.season_weights.fallback < 0.0
            || self.season_weights.weights.iter().any(|w| w.weight < 0.0 || !w.weight.is_finite())
        {
            return Err(FeatureError::InvalidConfig("season weights must be non-negative".into()));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(FeatureError::InvalidConfig(format!("Invalid log level: {other}")))
            }
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(FeatureError::InvalidConfig(format!("Invalid log format: {other}")))
            }
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| FeatureError::InvalidConfig(format!("{ENV_PREFIX}{key}={value} is not valid")))
}
