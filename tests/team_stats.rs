use std::fs;
use std::path::PathBuf;

use pl_dashboard::api_football::parse_team_statistics_json;
use pl_dashboard::model::{HomeAway, TeamStatistics};
use pl_dashboard::team_stats::{
    PenaltyRecord, formation_usage, goals_by_minute, penalty_record, performance_breakdown,
    record_totals,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn arsenal() -> TeamStatistics {
    parse_team_statistics_json(&read_fixture("team_statistics.json")).expect("fixture should parse")
}

#[test]
fn breakdown_has_home_and_away_per_category() {
    let rows = performance_breakdown(&arsenal());
    let flat: Vec<(&str, u32, u32)> = rows.iter().map(|r| (r.category, r.home, r.away)).collect();
    assert_eq!(
        flat,
        vec![
            ("Wins", 5, 2),
            ("Draws", 0, 1),
            ("Losses", 0, 0),
            ("Goals Scored", 11, 5),
            ("Clean Sheets", 4, 2),
        ]
    );
}

#[test]
fn empty_statistics_default_to_zero() {
    let stats = TeamStatistics::default();
    assert!(performance_breakdown(&stats).iter().all(|r| r.home == 0 && r.away == 0));
    let totals = record_totals(&stats);
    assert_eq!((totals.wins, totals.draws, totals.losses), (0, 0, 0));
    assert!(goals_by_minute(&stats).is_empty());
    assert!(formation_usage(&stats).is_empty());
    let pens = penalty_record(&stats);
    assert_eq!((pens.scored, pens.missed), (0, 0));
    assert!(pens.conversion_pct().is_none());
}

#[test]
fn totals_sum_home_and_away() {
    let totals = record_totals(&arsenal());
    assert_eq!((totals.wins, totals.draws, totals.losses), (7, 1, 0));
}

#[test]
fn minute_buckets_default_missing_totals() {
    let rows = goals_by_minute(&arsenal());
    assert_eq!(
        rows,
        vec![
            ("0-15".to_string(), 2),
            ("16-30".to_string(), 3),
            ("46-60".to_string(), 4),
            ("106-120".to_string(), 0),
        ]
    );
}

#[test]
fn formations_sorted_by_usage() {
    let rows = formation_usage(&arsenal());
    assert_eq!(
        rows,
        vec![("4-3-3".to_string(), 7), ("4-2-3-1".to_string(), 2)]
    );
}

#[test]
fn penalty_conversion() {
    let pens = penalty_record(&arsenal());
    assert_eq!((pens.scored, pens.missed), (2, 1));
    let pct = pens.conversion_pct().expect("penalties taken");
    assert!((pct - 66.666).abs() < 0.01);
}

#[test]
fn totals_saturate_on_extreme_counts() {
    let stats = TeamStatistics {
        wins: Some(HomeAway {
            home: u32::MAX,
            away: 1,
            total: 0,
        }),
        ..TeamStatistics::default()
    };
    let totals = record_totals(&stats);
    assert_eq!(totals.wins, u32::MAX);
    assert_eq!(totals.draws, 0);

    let pens = PenaltyRecord {
        scored: u32::MAX,
        missed: 1,
    };
    let pct = pens.conversion_pct().expect("penalties were taken");
    assert!(pct.is_finite());
}
