use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use chrono::DateTime;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::http_cache::fetch_json;
use crate::http_client::http_client;
use crate::model::{
    CompetitionRef, FixtureRow, FormationUse, HomeAway, MinuteBucket, PlayerRef, PlayerStatEntry,
    RecordLine, StandingRow, StatKind, TeamRef, TeamStatistics, TopPlayers,
};

const KEY_HEADER: &str = "X-RapidAPI-Key";
const HOST_HEADER: &str = "X-RapidAPI-Host";

pub fn endpoint_url(cfg: &DashboardConfig, path: &str, query: &[(&str, String)]) -> Result<Url> {
    let base = format!("{}/{}", cfg.api_base, path.trim_start_matches('/'));
    Url::parse_with_params(&base, query).with_context(|| format!("invalid endpoint url {base}"))
}

fn fetch_endpoint(cfg: &DashboardConfig, path: &str, query: &[(&str, String)]) -> Result<String> {
    let Some(api_key) = cfg.api_key.as_deref() else {
        return Err(anyhow!("VITE_API_KEY missing"));
    };
    let url = endpoint_url(cfg, path, query)?;
    debug!(%url, "api-football request");
    let client = http_client()?;
    let headers = [(KEY_HEADER, api_key), (HOST_HEADER, cfg.api_host.as_str())];
    fetch_json(client, url.as_str(), &headers, cfg.use_cache)
        .with_context(|| format!("{path} request failed"))
}

fn league_season(cfg: &DashboardConfig) -> Vec<(&'static str, String)> {
    vec![
        ("league", cfg.league_id.to_string()),
        ("season", cfg.season.to_string()),
    ]
}

pub fn fetch_league_logo(cfg: &DashboardConfig) -> Result<Option<String>> {
    let query = [
        ("id", cfg.league_id.to_string()),
        ("season", cfg.season.to_string()),
    ];
    let body = fetch_endpoint(cfg, "leagues", &query)?;
    parse_league_logo_json(&body)
}

pub fn fetch_standings(cfg: &DashboardConfig) -> Result<Vec<StandingRow>> {
    let body = fetch_endpoint(cfg, "standings", &league_season(cfg))?;
    parse_standings_json(&body)
}

pub fn fetch_recent_fixtures(cfg: &DashboardConfig) -> Result<Vec<FixtureRow>> {
    let mut query = league_season(cfg);
    query.push(("last", cfg.fixtures_last.to_string()));
    let body = fetch_endpoint(cfg, "fixtures", &query)?;
    parse_fixtures_json(&body)
}

pub fn fetch_teams(cfg: &DashboardConfig) -> Result<Vec<TeamRef>> {
    let body = fetch_endpoint(cfg, "teams", &league_season(cfg))?;
    parse_teams_json(&body)
}

pub fn fetch_team_statistics(cfg: &DashboardConfig, team_id: u32) -> Result<TeamStatistics> {
    let mut query = league_season(cfg);
    query.push(("team", team_id.to_string()));
    let body = fetch_endpoint(cfg, "teams/statistics", &query)?;
    parse_team_statistics_json(&body)
}

pub fn fetch_top_scorers(cfg: &DashboardConfig) -> Result<Vec<PlayerStatEntry>> {
    let body = fetch_endpoint(cfg, "players/topscorers", &league_season(cfg))?;
    parse_top_players_json(&body, StatKind::Goals)
}

pub fn fetch_top_assists(cfg: &DashboardConfig) -> Result<Vec<PlayerStatEntry>> {
    let body = fetch_endpoint(cfg, "players/topassists", &league_season(cfg))?;
    parse_top_players_json(&body, StatKind::Assists)
}

/// Both rankings, requested concurrently. Either failing fails the pair.
pub fn fetch_top_players(cfg: &DashboardConfig) -> Result<TopPlayers> {
    let (scorers, assists) = rayon::join(|| fetch_top_scorers(cfg), || fetch_top_assists(cfg));
    Ok(TopPlayers {
        scorers: scorers?,
        assists: assists?,
    })
}

/// Unwrap the API-Football envelope. `Ok(None)` means there is nothing to show:
/// an empty or `null` body, or no `response` member.
pub fn parse_envelope(raw: &str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let mut root: Value = serde_json::from_str(trimmed).context("invalid api-football json")?;
    if let Some(message) = provider_errors(root.get("errors")) {
        return Err(anyhow!("api-football error: {message}"));
    }
    Ok(match root.get_mut("response").map(Value::take) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    })
}

// `errors` is `[]` when clean and an object keyed by field when not.
fn provider_errors(errors: Option<&Value>) -> Option<String> {
    let parts: Vec<String> = match errors? {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", value_text(v)))
            .collect(),
        Value::Array(items) => items.iter().map(value_text).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn response_items(raw: &str) -> Result<Vec<Value>> {
    Ok(match parse_envelope(raw)? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

pub fn parse_league_logo_json(raw: &str) -> Result<Option<String>> {
    let items = response_items(raw)?;
    Ok(items
        .first()
        .and_then(|item| item.get("league"))
        .and_then(|league| opt_string(league, "logo")))
}

pub fn parse_standings_json(raw: &str) -> Result<Vec<StandingRow>> {
    let items = response_items(raw)?;
    let Some(table) = items
        .first()
        .and_then(|item| item.get("league"))
        .and_then(|league| league.get("standings"))
        .and_then(|groups| groups.get(0))
        .and_then(|group| group.as_array())
    else {
        return Ok(Vec::new());
    };
    Ok(table.iter().filter_map(parse_standing_row).collect())
}

fn parse_standing_row(v: &Value) -> Option<StandingRow> {
    let team = parse_team_ref(v.get("team")?)?;
    Some(StandingRow {
        rank: u32_at(v, &["rank"]).unwrap_or(0),
        team,
        points: u32_at(v, &["points"]).unwrap_or(0),
        goals_diff: v
            .get("goalsDiff")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(0),
        form: opt_string(v, "form"),
        group: opt_string(v, "group"),
        description: opt_string(v, "description"),
        all: parse_record_line(v.get("all")),
        home: parse_record_line(v.get("home")),
        away: parse_record_line(v.get("away")),
    })
}

fn parse_record_line(v: Option<&Value>) -> RecordLine {
    let Some(v) = v else {
        return RecordLine::default();
    };
    RecordLine {
        played: u32_at(v, &["played"]).unwrap_or(0),
        win: u32_at(v, &["win"]).unwrap_or(0),
        draw: u32_at(v, &["draw"]).unwrap_or(0),
        lose: u32_at(v, &["lose"]).unwrap_or(0),
        goals_for: u32_at(v, &["goals", "for"]).unwrap_or(0),
        goals_against: u32_at(v, &["goals", "against"]).unwrap_or(0),
    }
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<FixtureRow>> {
    let items = response_items(raw)?;
    Ok(items.iter().filter_map(parse_fixture_row).collect())
}

fn parse_fixture_row(v: &Value) -> Option<FixtureRow> {
    let fixture = v.get("fixture")?;
    let id = fixture.get("id")?.as_u64()?;
    let kickoff = fixture
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
    let teams = v.get("teams")?;
    let home = parse_team_ref(teams.get("home")?)?;
    let away = parse_team_ref(teams.get("away")?)?;
    let goal = |side: &str| {
        v.get("goals")
            .and_then(|g| g.get(side))
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
    };

    Some(FixtureRow {
        id,
        kickoff,
        status: fixture
            .get("status")
            .and_then(|s| opt_string(s, "short")),
        venue: fixture.get("venue").and_then(|s| opt_string(s, "name")),
        round: v.get("league").and_then(|l| opt_string(l, "round")),
        home,
        away,
        home_goals: goal("home"),
        away_goals: goal("away"),
    })
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<TeamRef>> {
    let items = response_items(raw)?;
    Ok(items
        .iter()
        .filter_map(|item| item.get("team").and_then(parse_team_ref))
        .collect())
}

pub fn parse_team_statistics_json(raw: &str) -> Result<TeamStatistics> {
    let Some(v) = parse_envelope(raw)? else {
        return Ok(TeamStatistics::default());
    };
    // An empty result set comes back as `[]` rather than an object.
    if !v.is_object() {
        return Ok(TeamStatistics::default());
    }

    let mut goals_for_by_minute: Vec<MinuteBucket> = v
        .get("goals")
        .and_then(|g| g.get("for"))
        .and_then(|f| f.get("minute"))
        .and_then(Value::as_object)
        .map(|minutes| {
            minutes
                .iter()
                .map(|(interval, bucket)| MinuteBucket {
                    interval: interval.clone(),
                    total: u32_at(bucket, &["total"]),
                    percentage: opt_string(bucket, "percentage"),
                })
                .collect()
        })
        .unwrap_or_default();
    goals_for_by_minute.sort_by_key(|b| interval_start(&b.interval));

    let lineups: Vec<FormationUse> = v
        .get("lineups")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(FormationUse {
                        formation: opt_string(row, "formation")?,
                        played: u32_at(row, &["played"]).unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let biggest_streak: BTreeMap<String, u32> = v
        .get("biggest")
        .and_then(|b| b.get("streak"))
        .and_then(Value::as_object)
        .map(|streak| {
            streak
                .iter()
                .filter_map(|(k, n)| Some((k.clone(), u32::try_from(n.as_u64()?).ok()?)))
                .collect()
        })
        .unwrap_or_default();

    Ok(TeamStatistics {
        team: v.get("team").and_then(parse_team_ref),
        form: opt_string(&v, "form"),
        played: home_away_at(&v, &["fixtures", "played"]),
        wins: home_away_at(&v, &["fixtures", "wins"]),
        draws: home_away_at(&v, &["fixtures", "draws"]),
        loses: home_away_at(&v, &["fixtures", "loses"]),
        goals_for: home_away_at(&v, &["goals", "for", "total"]),
        goals_against: home_away_at(&v, &["goals", "against", "total"]),
        clean_sheet: home_away_at(&v, &["clean_sheet"]),
        failed_to_score: home_away_at(&v, &["failed_to_score"]),
        goals_for_by_minute,
        lineups,
        penalty_scored: u32_at(&v, &["penalty", "scored", "total"]),
        penalty_missed: u32_at(&v, &["penalty", "missed", "total"]),
        biggest_streak,
    })
}

/// `"16-30"` -> 16. Unknown shapes sort last.
fn interval_start(interval: &str) -> u32 {
    interval
        .split('-')
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(u32::MAX)
}

pub fn parse_top_players_json(raw: &str, kind: StatKind) -> Result<Vec<PlayerStatEntry>> {
    let items = response_items(raw)?;
    Ok(items
        .iter()
        .filter_map(|item| parse_player_stat_entry(item, kind))
        .collect())
}

fn parse_player_stat_entry(v: &Value, kind: StatKind) -> Option<PlayerStatEntry> {
    let player_v = v.get("player")?;
    let player = PlayerRef {
        id: u32_at(player_v, &["id"])?,
        name: opt_string(player_v, "name").unwrap_or_default(),
        photo: opt_string(player_v, "photo"),
    };

    let stats = v
        .get("statistics")
        .and_then(|s| s.get(0))
        .unwrap_or(&Value::Null);
    let team = stats
        .get("team")
        .and_then(parse_team_ref)
        .unwrap_or_default();
    let league = stats.get("league").unwrap_or(&Value::Null);
    let competition = CompetitionRef {
        league_id: u32_at(league, &["id"]),
        league_name: opt_string(league, "name"),
        season: u32_at(league, &["season"]).and_then(|n| u16::try_from(n).ok()),
    };
    let value = match kind {
        StatKind::Goals => u32_at(stats, &["goals", "total"]),
        StatKind::Assists => u32_at(stats, &["goals", "assists"]),
    };
    // The provider spells it "appearences".
    let appearances = u32_at(stats, &["games", "appearences"]);

    Some(PlayerStatEntry {
        player,
        team,
        competition,
        kind,
        value,
        appearances,
    })
}

fn parse_team_ref(v: &Value) -> Option<TeamRef> {
    Some(TeamRef {
        id: u32_at(v, &["id"])?,
        name: opt_string(v, "name").unwrap_or_default(),
        logo: opt_string(v, "logo"),
    })
}

fn home_away_at(v: &Value, path: &[&str]) -> Option<HomeAway> {
    let node = walk(v, path)?;
    if !node.is_object() {
        return None;
    }
    Some(HomeAway {
        home: u32_at(node, &["home"]).unwrap_or(0),
        away: u32_at(node, &["away"]).unwrap_or(0),
        total: u32_at(node, &["total"]).unwrap_or(0),
    })
}

fn walk<'a>(v: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(v, |node, key| node.get(*key))
}

fn u32_at(v: &Value, path: &[&str]) -> Option<u32> {
    walk(v, path)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
}

fn opt_string(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
