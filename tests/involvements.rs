use std::collections::HashSet;

use pl_dashboard::involvements::{goal_involvements, top_goal_involvements};
use pl_dashboard::model::{CompetitionRef, PlayerRef, PlayerStatEntry, StatKind, TeamRef};

fn entry(id: u32, kind: StatKind, value: Option<u32>) -> PlayerStatEntry {
    PlayerStatEntry {
        player: PlayerRef {
            id,
            name: format!("Player {id}"),
            photo: None,
        },
        team: TeamRef {
            id: 100 + id,
            name: format!("Team {id}"),
            logo: None,
        },
        competition: CompetitionRef {
            league_id: Some(39),
            league_name: Some("Premier League".to_string()),
            season: Some(2025),
        },
        kind,
        value,
        appearances: None,
    }
}

fn scorer(id: u32, goals: u32) -> PlayerStatEntry {
    entry(id, StatKind::Goals, Some(goals))
}

fn assister(id: u32, assists: u32) -> PlayerStatEntry {
    entry(id, StatKind::Assists, Some(assists))
}

fn ids_and_totals(rows: &[pl_dashboard::involvements::CombinedInvolvement]) -> Vec<(u32, u32)> {
    rows.iter().map(|r| (r.player_id(), r.total())).collect()
}

#[test]
fn overlapping_lists_sum_per_player() {
    let scorers = vec![scorer(1, 10), scorer(2, 8)];
    let assists = vec![assister(2, 6), assister(3, 5)];

    let rows = goal_involvements(&scorers, &assists);
    assert_eq!(ids_and_totals(&rows), vec![(2, 14), (1, 10), (3, 5)]);

    let both = &rows[0];
    assert_eq!(both.goals, 8);
    assert_eq!(both.assists, 6);
}

#[test]
fn disjoint_lists_keep_single_statistic() {
    let scorers = vec![scorer(1, 4), scorer(2, 3)];
    let assists = vec![assister(3, 5), assister(4, 1)];

    let rows = goal_involvements(&scorers, &assists);
    for row in &rows {
        match row.player_id() {
            1 | 2 => {
                assert_eq!(row.assists, 0);
                assert_eq!(row.total(), row.goals);
            }
            3 | 4 => {
                assert_eq!(row.goals, 0);
                assert_eq!(row.total(), row.assists);
            }
            other => panic!("unexpected player {other}"),
        }
    }
    assert_eq!(ids_and_totals(&rows), vec![(3, 5), (1, 4), (2, 3), (4, 1)]);
}

#[test]
fn truncates_to_five_unique_players() {
    let scorers: Vec<_> = (1..=6).map(|id| scorer(id, 20 - id)).collect();
    let assists: Vec<_> = (4..=9).map(|id| assister(id, 12 - id)).collect();

    let rows = goal_involvements(&scorers, &assists);
    assert_eq!(rows.len(), 5);

    let ids: HashSet<u32> = rows.iter().map(|r| r.player_id()).collect();
    assert_eq!(ids.len(), rows.len());
    assert!(rows.windows(2).all(|w| w[0].total() >= w[1].total()));
}

#[test]
fn output_length_is_distinct_player_count_when_small() {
    let scorers = vec![scorer(1, 2), scorer(2, 1)];
    let assists = vec![assister(1, 1)];
    assert_eq!(goal_involvements(&scorers, &assists).len(), 2);
    assert!(goal_involvements(&[], &[]).is_empty());
}

#[test]
fn missing_statistics_count_as_zero() {
    let scorers = vec![entry(1, StatKind::Goals, None), scorer(2, 3)];
    let assists = vec![entry(1, StatKind::Assists, Some(2)), entry(5, StatKind::Assists, None)];

    let rows = goal_involvements(&scorers, &assists);
    assert_eq!(ids_and_totals(&rows), vec![(2, 3), (1, 2), (5, 0)]);
    let one = rows.iter().find(|r| r.player_id() == 1).unwrap();
    assert_eq!(one.goals, 0);
    assert_eq!(one.assists, 2);
}

#[test]
fn ties_keep_first_seen_order() {
    // Player 3 only assists, so is first seen after every scorer.
    let scorers = vec![scorer(9, 5), scorer(4, 3), scorer(7, 5)];
    let assists = vec![assister(3, 5), assister(4, 2)];

    let rows = goal_involvements(&scorers, &assists);
    assert_eq!(ids_and_totals(&rows), vec![(9, 5), (4, 5), (7, 5), (3, 5)]);
}

#[test]
fn custom_limit_is_respected() {
    let scorers: Vec<_> = (1..=10).map(|id| scorer(id, id)).collect();
    let rows = top_goal_involvements(&scorers, &[], 3);
    assert_eq!(ids_and_totals(&rows), vec![(10, 10), (9, 9), (8, 8)]);
}

#[test]
fn deterministic_for_same_input() {
    let scorers = vec![scorer(1, 3), scorer(2, 3), scorer(3, 3)];
    let assists = vec![assister(4, 3), assister(1, 0)];
    let first = goal_involvements(&scorers, &assists);
    for _ in 0..10 {
        assert_eq!(goal_involvements(&scorers, &assists), first);
    }
}

#[test]
fn share_split_rounds_to_whole_percent() {
    let scorers = vec![scorer(1, 8), scorer(2, 1), scorer(3, 0)];
    let assists = vec![assister(1, 6), assister(2, 7), assister(4, 4)];
    let rows = top_goal_involvements(&scorers, &assists, 10);
    let split: Vec<(u32, Option<(u32, u32)>)> =
        rows.iter().map(|r| (r.player_id(), r.share_pct())).collect();
    assert_eq!(
        split,
        vec![
            (1, Some((57, 43))),
            (2, Some((13, 88))),
            (4, Some((0, 100))),
            (3, None),
        ]
    );
}
