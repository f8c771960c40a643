use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: u32,
    pub name: String,
    pub photo: Option<String>,
}

/// Competition/season a statistic was recorded in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionRef {
    pub league_id: Option<u32>,
    pub league_name: Option<String>,
    pub season: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    Goals,
    Assists,
}

impl StatKind {
    pub fn label(self) -> &'static str {
        match self {
            StatKind::Goals => "Goals",
            StatKind::Assists => "Assists",
        }
    }
}

/// One row of a top-scorers or top-assists ranking. `value` is `None` when the
/// provider left the statistic out or sent `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatEntry {
    pub player: PlayerRef,
    pub team: TeamRef,
    pub competition: CompetitionRef,
    pub kind: StatKind,
    pub value: Option<u32>,
    pub appearances: Option<u32>,
}

impl PlayerStatEntry {
    pub fn stat(&self) -> u32 {
        self.value.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopPlayers {
    pub scorers: Vec<PlayerStatEntry>,
    pub assists: Vec<PlayerStatEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLine {
    pub played: u32,
    pub win: u32,
    pub draw: u32,
    pub lose: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub team: TeamRef,
    pub points: u32,
    pub goals_diff: i32,
    pub form: Option<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub all: RecordLine,
    pub home: RecordLine,
    pub away: RecordLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRow {
    pub id: u64,
    pub kickoff: Option<DateTime<FixedOffset>>,
    pub status: Option<String>,
    pub venue: Option<String>,
    pub round: Option<String>,
    pub home: TeamRef,
    pub away: TeamRef,
    pub home_goals: Option<u8>,
    pub away_goals: Option<u8>,
}

impl FixtureRow {
    pub fn score_line(&self) -> String {
        format!(
            "{} - {}",
            self.home_goals.unwrap_or(0),
            self.away_goals.unwrap_or(0)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeAway {
    pub home: u32,
    pub away: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteBucket {
    pub interval: String,
    pub total: Option<u32>,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationUse {
    pub formation: String,
    pub played: u32,
}

/// Subset of `/teams/statistics` the dashboard reads. Everything is optional
/// because early-season payloads arrive with `null` in most leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub team: Option<TeamRef>,
    pub form: Option<String>,
    pub played: Option<HomeAway>,
    pub wins: Option<HomeAway>,
    pub draws: Option<HomeAway>,
    pub loses: Option<HomeAway>,
    pub goals_for: Option<HomeAway>,
    pub goals_against: Option<HomeAway>,
    pub clean_sheet: Option<HomeAway>,
    pub failed_to_score: Option<HomeAway>,
    pub goals_for_by_minute: Vec<MinuteBucket>,
    pub lineups: Vec<FormationUse>,
    pub penalty_scored: Option<u32>,
    pub penalty_missed: Option<u32>,
    pub biggest_streak: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub team: String,
    pub probability: f64,
    pub current_points: Option<f64>,
    pub current_goal_diff: Option<f64>,
}

/// Input record for the prediction service's `/predict` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub team: String,
    pub points: i32,
    pub goal_diff: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub season: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResult {
    pub team: String,
    pub top6_probability: f64,
    pub top6_prediction: u8,
}
