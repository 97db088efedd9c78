//! Team context: contender flags from conference standings

use crate::models::TeamStanding;
use std::collections::HashMap;
use tracing::debug;

/// Default number of contender slots per conference
pub const DEFAULT_CONTENDER_SLOTS: usize = 6;

/// Maps (team, season) to a contender flag
#[derive(Debug, Clone)]
pub struct TeamContextMerger {
    contenders: HashMap<(String, i32), bool>,
    default_contender: bool,
}

impl Default for TeamContextMerger {
    fn default() -> Self {
        Self::without_standings(true)
    }
}

impl TeamContextMerger {
    /// No standings supplied: every lookup yields `default_contender`
    pub fn without_standings(default_contender: bool) -> Self {
        Self { contenders: HashMap::new(), default_contender }
    }

    /// Build from standings rows in supplied rank order
    ///
    /// The first `contender_slots` rows of each (season, conference) are contenders.
    /// Rows are not re-sorted. A team listed twice for a season keeps its last flag.
    pub fn from_standings(
        standings: &[TeamStanding],
        contender_slots: usize,
        default_contender: bool,
    ) -> Self {
        let mut seen: HashMap<(i32, &str), usize> = HashMap::new();
        let mut contenders = HashMap::with_capacity(standings.len());

        for row in standings {
            let position = seen.entry((row.season_end_year, row.conference.as_str())).or_insert(0);
            contenders.insert((row.team.clone(), row.season_end_year), *position < contender_slots);
            *position += 1;
        }

        debug!(teams = contenders.len(), "built contender map from standings");
        Self { contenders, default_contender }
    }

    /// Contender flag for a team in a season
    pub fn is_contender(&self, team: &str, season_end_year: i32) -> bool {
        self.contenders
            .get(&(team.to_string(), season_end_year))
            .copied()
            .unwrap_or(self.default_contender)
    }

    pub fn has_standings(&self) -> bool {
        !self.contenders.is_empty()
    }
}
