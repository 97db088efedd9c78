use crate::error::{FeatureError, Result};
use crate::scoring::{BoxScore, FantasyScoring};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Game log row as handed over by the acquisition layer
///
/// Every column is optional at this level. `GameRecord::try_from_raw` enforces the
/// required ones and documents the defaults for the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGameRecord {
    pub player_name: Option<String>,
    pub player_slug: Option<String>,
    pub date: Option<NaiveDate>,
    pub season_end_year: Option<i32>,
    pub team: Option<String>,
    pub age: Option<f64>,
    pub seconds_played: Option<f64>,
    pub points_scored: Option<f64>,
    pub offensive_rebounds: Option<f64>,
    pub defensive_rebounds: Option<f64>,
    pub assists: Option<f64>,
    pub steals: Option<f64>,
    pub blocks: Option<f64>,
    pub turnovers: Option<f64>,
    pub fantasy_points: Option<f64>,
}

/// One player's box score for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Display name; players are grouped by it
    pub player_name: String,

    /// Provider slug, empty when not supplied
    pub player_slug: String,

    pub date: NaiveDate,

    /// Season identifier (2025 = 2024-25 season)
    pub season_end_year: i32,

    /// Team abbreviation, empty when not supplied
    pub team: String,

    /// Age at time of game, `None` when unknown
    pub age: Option<f64>,

    /// Playing time, `None` when unknown
    pub seconds_played: Option<f64>,

    // Box-score counts; `None` means the provider did not report the column.
    pub points_scored: Option<f64>,
    pub offensive_rebounds: Option<f64>,
    pub defensive_rebounds: Option<f64>,
    pub assists: Option<f64>,
    pub steals: Option<f64>,
    pub blocks: Option<f64>,
    pub turnovers: Option<f64>,

    pub fantasy_points: f64,
}

/// Stat series the moving-average optimizer can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    FantasyPoints,
    Points,
    OffensiveRebounds,
    TotalRebounds,
    Assists,
}

impl GameRecord {
    /// Validate a raw row
    ///
    /// `player_name`, `date`, `season_end_year` and `fantasy_points` are required.
    /// When `derive_with` is given, a missing fantasy points value is computed from
    /// the box score instead of failing.
    pub fn try_from_raw(
        raw: RawGameRecord,
        index: usize,
        derive_with: Option<&FantasyScoring>,
    ) -> Result<Self> {
        let missing = |field: &'static str| FeatureError::MissingField { index, field };

        let player_name = raw.player_name.ok_or_else(|| missing("player_name"))?;
        let date = raw.date.ok_or_else(|| missing("date"))?;
        let season_end_year = raw.season_end_year.ok_or_else(|| missing("season_end_year"))?;

        let mut record = Self {
            player_name,
            player_slug: raw.player_slug.unwrap_or_default(),
            date,
            season_end_year,
            team: raw.team.unwrap_or_default(),
            age: raw.age.filter(|a| a.is_finite()),
            seconds_played: raw.seconds_played.filter(|s| s.is_finite()),
            points_scored: raw.points_scored,
            offensive_rebounds: raw.offensive_rebounds,
            defensive_rebounds: raw.defensive_rebounds,
            assists: raw.assists,
            steals: raw.steals,
            blocks: raw.blocks,
            turnovers: raw.turnovers,
            fantasy_points: 0.0,
        };

        record.fantasy_points = match (raw.fantasy_points, derive_with) {
            (Some(fp), _) => fp,
            (None, Some(scoring)) => scoring.score(&record.box_score()),
            (None, None) => return Err(missing("fantasy_points")),
        };

        Ok(record)
    }

    /// Box score with unreported counts defaulted to zero
    pub fn box_score(&self) -> BoxScore {
        BoxScore {
            points_scored: self.points_scored.unwrap_or(0.0),
            offensive_rebounds: self.offensive_rebounds.unwrap_or(0.0),
            defensive_rebounds: self.defensive_rebounds.unwrap_or(0.0),
            assists: self.assists.unwrap_or(0.0),
            steals: self.steals.unwrap_or(0.0),
            blocks: self.blocks.unwrap_or(0.0),
            turnovers: self.turnovers.unwrap_or(0.0),
        }
    }

    /// Value of a stat, `None` when the provider did not report it
    pub fn stat(&self, category: StatCategory) -> Option<f64> {
        match category {
            StatCategory::FantasyPoints => Some(self.fantasy_points),
            StatCategory::Points => self.points_scored,
            StatCategory::OffensiveRebounds => self.offensive_rebounds,
            StatCategory::TotalRebounds => {
                match (self.offensive_rebounds, self.defensive_rebounds) {
                    (None, None) => None,
                    (o, d) => Some(o.unwrap_or(0.0) + d.unwrap_or(0.0)),
                }
            }
            StatCategory::Assists => self.assists,
        }
    }
}

/// One historical injury entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRecord {
    pub player_name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// One row of conference standings
///
/// Rows are expected in rank order within each (season, conference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team: String,
    pub season_end_year: i32,
    pub conference: String,
}

/// Final per-player feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub player_name: String,
    pub player_slug: String,
    pub consistency_score: f64,
    pub floor: f64,
    pub ceiling: f64,
    pub avg_fp: f64,
    pub median_fp: f64,
    pub std_fp: f64,
    pub coef_variation: f64,
    pub iqr_ratio: f64,
    pub games_played: usize,
    pub optimized_ma_fp: f64,
    pub optimized_ma_points: f64,
    pub optimized_ma_rebounds: f64,
    pub optimized_ma_assists: f64,
    pub injury_risk_score: f64,
    pub age_adjustment: f64,
    pub age: f64,
    pub is_contender: bool,
    pub team: String,
    pub season_end_year: i32,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub players_processed: usize,
    pub records_processed: usize,

    /// Players whose latest season was below the consistency minimum
    pub insufficient_samples: usize,

    /// Moving averages produced by the fitted regression
    pub regression_fits: usize,

    /// Moving averages produced by exponential smoothing
    pub smoothing_fallbacks: usize,

    pub completed_at: DateTime<Utc>,
}

/// Rows plus run summary
#[derive(Debug, Clone)]
pub struct FeatureRun {
    pub rows: Vec<FeatureRow>,
    pub report: PipelineReport,
}
