use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{PlayerRef, PlayerStatEntry, TeamRef};

pub const DEFAULT_INVOLVEMENT_LIMIT: usize = 5;

/// Goals plus assists for one player in one competition/season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedInvolvement {
    pub player: PlayerRef,
    pub team: TeamRef,
    pub goals: u32,
    pub assists: u32,
}

impl CombinedInvolvement {
    pub fn player_id(&self) -> u32 {
        self.player.id
    }

    pub fn total(&self) -> u32 {
        self.goals.saturating_add(self.assists)
    }

    /// Goals and assists as whole-percent shares of `total()`, rounded half up.
    /// `None` when the player has neither.
    pub fn share_pct(&self) -> Option<(u32, u32)> {
        let total = f64::from(self.goals) + f64::from(self.assists);
        if total == 0.0 {
            return None;
        }
        let pct = |n: u32| (f64::from(n) * 100.0 / total).round() as u32;
        Some((pct(self.goals), pct(self.assists)))
    }
}

/// Merge a top-scorers ranking and a top-assists ranking into the players with
/// the most goal involvements, keeping the first `DEFAULT_INVOLVEMENT_LIMIT`.
pub fn goal_involvements(
    scorers: &[PlayerStatEntry],
    assists: &[PlayerStatEntry],
) -> Vec<CombinedInvolvement> {
    top_goal_involvements(scorers, assists, DEFAULT_INVOLVEMENT_LIMIT)
}

/// Ranked by total descending. Equal totals keep the order in which each player
/// id was first seen: scorers in list order, then players only in `assists`.
pub fn top_goal_involvements(
    scorers: &[PlayerStatEntry],
    assists: &[PlayerStatEntry],
    limit: usize,
) -> Vec<CombinedInvolvement> {
    let mut rows = combine(scorers, assists);
    // Stable sort keeps first-seen order among ties.
    rows.sort_by(|a, b| b.total().cmp(&a.total()));
    rows.truncate(limit);
    rows
}

fn combine(scorers: &[PlayerStatEntry], assists: &[PlayerStatEntry]) -> Vec<CombinedInvolvement> {
    let mut rows: Vec<CombinedInvolvement> = Vec::with_capacity(scorers.len() + assists.len());
    let mut index: HashMap<u32, usize> = HashMap::new();

    for entry in scorers {
        let goals = entry.stat();
        match index.get(&entry.player.id) {
            Some(&slot) => {
                let row = &mut rows[slot];
                row.goals = goals;
                row.player = entry.player.clone();
                row.team = entry.team.clone();
            }
            None => {
                index.insert(entry.player.id, rows.len());
                rows.push(CombinedInvolvement {
                    player: entry.player.clone(),
                    team: entry.team.clone(),
                    goals,
                    assists: 0,
                });
            }
        }
    }

    for entry in assists {
        let assists = entry.stat();
        match index.get(&entry.player.id) {
            Some(&slot) => {
                let row = &mut rows[slot];
                row.assists = assists;
                row.player = entry.player.clone();
                row.team = entry.team.clone();
            }
            None => {
                index.insert(entry.player.id, rows.len());
                rows.push(CombinedInvolvement {
                    player: entry.player.clone(),
                    team: entry.team.clone(),
                    goals: 0,
                    assists,
                });
            }
        }
    }

    rows
}
