use serde::Serialize;

use crate::model::{HomeAway, TeamStatistics};

pub const FORMATION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceRow {
    pub category: &'static str,
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordTotals {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PenaltyRecord {
    pub scored: u32,
    pub missed: u32,
}

impl PenaltyRecord {
    pub fn conversion_pct(&self) -> Option<f64> {
        let taken = self.scored.saturating_add(self.missed);
        if taken == 0 {
            return None;
        }
        Some(self.scored as f64 * 100.0 / taken as f64)
    }
}

/// Home/away split for the headline categories; absent values read as 0.
pub fn performance_breakdown(stats: &TeamStatistics) -> Vec<PerformanceRow> {
    let row = |category: &'static str, split: Option<HomeAway>| {
        let split = split.unwrap_or_default();
        PerformanceRow {
            category,
            home: split.home,
            away: split.away,
        }
    };
    vec![
        row("Wins", stats.wins),
        row("Draws", stats.draws),
        row("Losses", stats.loses),
        row("Goals Scored", stats.goals_for),
        row("Clean Sheets", stats.clean_sheet),
    ]
}

pub fn record_totals(stats: &TeamStatistics) -> RecordTotals {
    let sum = |split: Option<HomeAway>| split.map(|s| s.home.saturating_add(s.away)).unwrap_or(0);
    RecordTotals {
        wins: sum(stats.wins),
        draws: sum(stats.draws),
        losses: sum(stats.loses),
    }
}

pub fn goals_by_minute(stats: &TeamStatistics) -> Vec<(String, u32)> {
    stats
        .goals_for_by_minute
        .iter()
        .map(|b| (b.interval.clone(), b.total.unwrap_or(0)))
        .collect()
}

/// Most-used formations first; ties keep provider order.
pub fn formation_usage(stats: &TeamStatistics) -> Vec<(String, u32)> {
    let mut rows: Vec<(String, u32)> = stats
        .lineups
        .iter()
        .map(|l| (l.formation.clone(), l.played))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows.truncate(FORMATION_LIMIT);
    rows
}

pub fn penalty_record(stats: &TeamStatistics) -> PenaltyRecord {
    PenaltyRecord {
        scored: stats.penalty_scored.unwrap_or(0),
        missed: stats.penalty_missed.unwrap_or(0),
    }
}
