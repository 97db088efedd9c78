//! Injury risk heuristic

use crate::consistency::mean;
use crate::models::{GameRecord, InjuryRecord};
use std::borrow::Borrow;
use std::collections::HashMap;

/// Default games in a full regular season
pub const DEFAULT_EXPECTED_GAMES: u32 = 82;

/// Games below which a flat penalty applies regardless of season length
const LOW_GAMES_THRESHOLD: usize = 60;

/// Games needed before playing-time volatility counts
const MIN_MINUTES_GAMES: usize = 6;

/// Historical injury counts keyed by player display name
#[derive(Debug, Clone, Default)]
pub struct InjuryHistory {
    counts: HashMap<String, usize>,
}

impl InjuryHistory {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InjuryRecord>,
    {
        let mut counts = HashMap::new();
        for record in records {
            *counts.entry(record.player_name.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Number of recorded injuries, `None` if the player never appears
    pub fn injury_count(&self, player_name: &str) -> Option<usize> {
        self.counts.get(player_name).copied()
    }
}

/// Scores injury risk on a 0-100 scale (higher is riskier)
#[derive(Debug, Clone, Copy)]
pub struct InjuryRiskScorer {
    expected_games: u32,
}

impl Default for InjuryRiskScorer {
    fn default() -> Self {
        Self::new(DEFAULT_EXPECTED_GAMES)
    }
}

impl InjuryRiskScorer {
    pub fn new(expected_games: u32) -> Self {
        Self { expected_games }
    }

    /// Score one player from their most recent season's games
    ///
    /// Missed games, minutes volatility and injury history add up, then the sum
    /// is clamped. The fixed sub-60-games penalty stacks with the missed-games
    /// bucket for short seasons.
    pub fn score<R: Borrow<GameRecord>>(
        &self,
        player_name: &str,
        recent_games: &[R],
        history: Option<&InjuryHistory>,
    ) -> f64 {
        let games_played = recent_games.len();
        let expected = f64::from(self.expected_games);
        let mut risk = 0.0;

        if (games_played as f64) < expected * 0.7 {
            risk += 30.0;
        } else if (games_played as f64) < expected * 0.85 {
            risk += 15.0;
        }

        // Gated on games played; unreported minutes are skipped in the CV
        if games_played >= MIN_MINUTES_GAMES {
            let minutes: Vec<f64> = recent_games
                .iter()
                .filter_map(|g| g.borrow().seconds_played)
                .map(|s| s / 60.0)
                .collect();
            if let Some(cv) = sample_coef_variation(&minutes) {
                risk += (cv * 50.0).min(20.0);
            }
        }

        if let Some(count) = history.and_then(|h| h.injury_count(player_name)) {
            risk += (count as f64 * 10.0).min(30.0);
        }

        if games_played < LOW_GAMES_THRESHOLD {
            risk += 20.0;
        }

        risk.clamp(0.0, 100.0)
    }
}

/// Sample (n - 1) standard deviation over mean, `None` below two values or a non-positive mean
fn sample_coef_variation(values: &[f64]) -> Option<f64> {
    let avg = mean(values);
    if values.len() < 2 || avg <= 0.0 {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt() / avg)
}
