//! Feature pipeline orchestration
//!
//! Records are grouped by player, each player's features are computed by a pure
//! function of that player's games plus the two read-only lookups, and team
//! context is merged in last. Players are independent, so the per-player step
//! can fan out across the rayon pool.

use crate::age_curve::age_adjustment;
use crate::config::{FeatureConfig, ReboundSource, SeasonWeights};
use crate::consistency::{ConsistencyAnalyzer, ConsistencyMetrics};
use crate::error::Result;
use crate::injury::{InjuryHistory, InjuryRiskScorer};
use crate::models::{
    FeatureRow, FeatureRun, GameRecord, InjuryRecord, PipelineReport, RawGameRecord,
    StatCategory, TeamStanding,
};
use crate::moving_average::{MovingAverage, MovingAverageOptimizer};
use crate::scoring::FantasyScoring;
use crate::team_context::TeamContextMerger;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Features for one player before team context is merged in
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFeatures {
    pub player_name: String,
    pub player_slug: String,
    pub consistency: ConsistencyMetrics,
    pub optimized_ma_fp: f64,
    pub optimized_ma_points: f64,
    pub optimized_ma_rebounds: f64,
    pub optimized_ma_assists: f64,
    pub injury_risk_score: f64,
    pub age_adjustment: f64,
    pub age: f64,
    /// Team of the chronologically last game
    pub team: String,
    /// Most recent season the player appears in
    pub season_end_year: i32,
    pub regression_fits: usize,
    pub smoothing_fallbacks: usize,
}

impl PlayerFeatures {
    fn into_row(self, is_contender: bool) -> FeatureRow {
        let c = self.consistency;
        FeatureRow {
            player_name: self.player_name,
            player_slug: self.player_slug,
            consistency_score: c.consistency_score,
            floor: c.floor,
            ceiling: c.ceiling,
            avg_fp: c.avg_fp,
            median_fp: c.median_fp,
            std_fp: c.std_fp,
            coef_variation: c.coef_variation,
            iqr_ratio: c.iqr_ratio,
            games_played: c.games_played,
            optimized_ma_fp: self.optimized_ma_fp,
            optimized_ma_points: self.optimized_ma_points,
            optimized_ma_rebounds: self.optimized_ma_rebounds,
            optimized_ma_assists: self.optimized_ma_assists,
            injury_risk_score: self.injury_risk_score,
            age_adjustment: self.age_adjustment,
            age: self.age,
            is_contender,
            team: self.team,
            season_end_year: self.season_end_year,
        }
    }
}

/// Builds the per-player feature table
pub struct FeaturePipeline {
    config: FeatureConfig,
    consistency: ConsistencyAnalyzer,
    injury: InjuryRiskScorer,
    fantasy_points_ma: MovingAverageOptimizer,
    stat_ma: MovingAverageOptimizer,
    injury_history: Option<InjuryHistory>,
    team_context: TeamContextMerger,
    scoring: FantasyScoring,
}

impl FeaturePipeline {
    /// Create a pipeline with no injury history and no standings
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;

        let ma = &config.moving_average;
        Ok(Self {
            consistency: ConsistencyAnalyzer::new(config.consistency.min_games),
            injury: InjuryRiskScorer::new(config.injury.expected_games),
            fantasy_points_ma: MovingAverageOptimizer::new(ma.fantasy_points_lag, ma.train_cutoff),
            stat_ma: MovingAverageOptimizer::new(ma.stat_lag, ma.train_cutoff),
            injury_history: None,
            team_context: TeamContextMerger::without_standings(
                config.team_context.default_contender,
            ),
            scoring: FantasyScoring::yahoo(),
            config,
        })
    }

    /// Attach historical injuries keyed by player display name
    pub fn with_injury_history(mut self, records: &[InjuryRecord]) -> Self {
        self.injury_history = Some(InjuryHistory::from_records(records));
        self
    }

    /// Attach conference standings in rank order
    pub fn with_standings(mut self, standings: &[TeamStanding]) -> Self {
        self.team_context = TeamContextMerger::from_standings(
            standings,
            self.config.team_context.contender_slots,
            self.config.team_context.default_contender,
        );
        self
    }

    /// Replace the scoring used to derive missing fantasy points
    pub fn with_scoring(mut self, scoring: FantasyScoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Season recency weights for downstream blending
    pub fn season_weights(&self) -> &SeasonWeights {
        &self.config.season_weights
    }

    /// Validate raw rows, failing on the first structurally malformed one
    pub fn validate_records(&self, raw: Vec<RawGameRecord>) -> Result<Vec<GameRecord>> {
        let derive_with =
            self.config.pipeline.derive_missing_fantasy_points.then_some(&self.scoring);
        raw.into_iter()
            .enumerate()
            .map(|(index, row)| GameRecord::try_from_raw(row, index, derive_with))
            .collect()
    }

    /// Validate raw rows and run the pipeline
    pub fn run_raw(&self, raw: Vec<RawGameRecord>) -> Result<FeatureRun> {
        let records = self.validate_records(raw)?;
        Ok(self.run(&records))
    }

    /// Feature rows only
    pub fn build_feature_table(&self, records: &[GameRecord]) -> Vec<FeatureRow> {
        self.run(records).rows
    }

    /// Run the pipeline over validated records
    ///
    /// Emits one row per distinct player name, sorted by name.
    pub fn run(&self, records: &[GameRecord]) -> FeatureRun {
        info!(
            records = records.len(),
            parallel = self.config.pipeline.parallel,
            "building player features"
        );

        let mut by_player: BTreeMap<&str, Vec<&GameRecord>> = BTreeMap::new();
        for record in records {
            by_player.entry(record.player_name.as_str()).or_default().push(record);
        }
        let groups: Vec<Vec<&GameRecord>> = by_player.into_values().collect();

        let players: Vec<PlayerFeatures> = if self.config.pipeline.parallel {
            groups.into_par_iter().map(|games| self.player_features(games)).collect()
        } else {
            groups.into_iter().map(|games| self.player_features(games)).collect()
        };

        let report = PipelineReport {
            players_processed: players.len(),
            records_processed: records.len(),
            insufficient_samples: players
                .iter()
                .filter(|p| p.consistency.games_played < self.consistency.min_games())
                .count(),
            regression_fits: players.iter().map(|p| p.regression_fits).sum(),
            smoothing_fallbacks: players.iter().map(|p| p.smoothing_fallbacks).sum(),
            completed_at: Utc::now(),
        };

        let rows = self.merge_team_context(players);

        info!(
            players = report.players_processed,
            insufficient_samples = report.insufficient_samples,
            regression_fits = report.regression_fits,
            smoothing_fallbacks = report.smoothing_fallbacks,
            "player features complete"
        );

        FeatureRun { rows, report }
    }

    /// Left-merge contender flags keyed by (last team, latest season)
    pub fn merge_team_context(&self, players: Vec<PlayerFeatures>) -> Vec<FeatureRow> {
        players
            .into_iter()
            .map(|p| {
                let is_contender = self.team_context.is_contender(&p.team, p.season_end_year);
                p.into_row(is_contender)
            })
            .collect()
    }

    /// Compute one player's features from all of their games
    ///
    /// `games` must all belong to one player and be non-empty.
    pub fn player_features(&self, mut games: Vec<&GameRecord>) -> PlayerFeatures {
        games.sort_by_key(|g| g.date);

        let latest_season = games.iter().map(|g| g.season_end_year).max().unwrap_or_default();
        let recent: Vec<&GameRecord> =
            games.iter().copied().filter(|g| g.season_end_year == latest_season).collect();
        let last = games.last();

        let player_name = last.map(|g| g.player_name.clone()).unwrap_or_default();

        let recent_fp: Vec<f64> = recent.iter().map(|g| g.fantasy_points).collect();
        let consistency = self.consistency.analyze(&recent_fp);

        let rebound_stat = match self.config.moving_average.rebound_source {
            ReboundSource::Offensive => StatCategory::OffensiveRebounds,
            ReboundSource::Total => StatCategory::TotalRebounds,
        };
        let averages = [
            moving_average(&self.fantasy_points_ma, &games, StatCategory::FantasyPoints),
            moving_average(&self.stat_ma, &games, StatCategory::Points),
            moving_average(&self.stat_ma, &games, rebound_stat),
            moving_average(&self.stat_ma, &games, StatCategory::Assists),
        ];
        let latest = |i: usize| averages[i].as_ref().map(MovingAverage::latest).unwrap_or(0.0);

        let injury_risk_score =
            self.injury.score(&player_name, &recent, self.injury_history.as_ref());

        let age = last.and_then(|g| g.age).unwrap_or(self.config.age.default_age);

        debug!(
            player = %player_name,
            games = games.len(),
            recent_games = recent.len(),
            season = latest_season,
            "computed player features"
        );

        PlayerFeatures {
            player_slug: last.map(|g| g.player_slug.clone()).unwrap_or_default(),
            consistency,
            optimized_ma_fp: latest(0),
            optimized_ma_points: latest(1),
            optimized_ma_rebounds: latest(2),
            optimized_ma_assists: latest(3),
            injury_risk_score,
            age_adjustment: age_adjustment(Some(age)),
            age,
            team: last.map(|g| g.team.clone()).unwrap_or_default(),
            season_end_year: latest_season,
            regression_fits: averages.iter().flatten().filter(|m| m.is_regression()).count(),
            smoothing_fallbacks: averages.iter().flatten().filter(|m| m.is_smoothing()).count(),
            player_name,
        }
    }
}

/// Moving average for one stat, `None` when no game reports the stat
fn moving_average(
    optimizer: &MovingAverageOptimizer,
    games: &[&GameRecord],
    category: StatCategory,
) -> Option<MovingAverage> {
    if games.iter().all(|g| g.stat(category).is_none()) {
        return None;
    }
    let series: Vec<_> = games.iter().map(|g| (g.date, g.stat(category).unwrap_or(0.0))).collect();
    Some(optimizer.optimize(&series))
}
