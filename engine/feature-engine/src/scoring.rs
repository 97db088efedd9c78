//! Fantasy point scoring

use serde::{Deserialize, Serialize};

/// Box-score counts for one game
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub points_scored: f64,
    pub offensive_rebounds: f64,
    pub defensive_rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
}

impl BoxScore {
    pub fn total_rebounds(&self) -> f64 {
        self.offensive_rebounds + self.defensive_rebounds
    }
}

/// Per-category fantasy point weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FantasyScoring {
    pub points_scored: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
}

impl FantasyScoring {
    /// Yahoo default scoring
    pub fn yahoo() -> Self {
        Self {
            points_scored: 1.0,
            rebounds: 1.2,
            assists: 1.5,
            steals: 3.0,
            blocks: 3.0,
            turnovers: -1.0,
        }
    }

    /// Fantasy points for a box score
    pub fn score(&self, box_score: &BoxScore) -> f64 {
        box_score.points_scored * self.points_scored
            + box_score.total_rebounds() * self.rebounds
            + box_score.assists * self.assists
            + box_score.steals * self.steals
            + box_score.blocks * self.blocks
            + box_score.turnovers * self.turnovers
    }
}

impl Default for FantasyScoring {
    fn default() -> Self {
        Self::yahoo()
    }
}
