//! Feature Engine
//!
//! Turns per-game player records into one row of predictive features per player
//! for fantasy basketball valuation: consistency metrics, regression-optimized
//! moving averages, an injury risk score, an age adjustment and a contender flag
//! from team standings.
//!
//! Acquisition and persistence live elsewhere. This crate works on fully
//! materialized records and two optional lookups (injury history, standings).

pub mod age_curve;
pub mod config;
pub mod consistency;
pub mod error;
pub mod injury;
pub mod logging;
pub mod models;
pub mod moving_average;
pub mod pipeline;
pub mod scoring;
pub mod team_context;


pub use age_curve::age_adjustment;
pub use config::FeatureConfig;
pub use consistency::{ConsistencyAnalyzer, ConsistencyMetrics};
pub use error::{FeatureError, RegressionError, Result};
pub use injury::{InjuryHistory, InjuryRiskScorer};
pub use models::*;
pub use moving_average::{AverageMethod, MovingAverage, MovingAverageOptimizer};
pub use pipeline::{FeaturePipeline, PlayerFeatures};
pub use scoring::{BoxScore, FantasyScoring};
pub use team_context::TeamContextMerger;
