use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::http_cache::{fetch_json, http_error};
use crate::http_client::http_client;
use crate::model::{PredictResult, PredictionRow, StandingRow, TeamRef, TeamSeasonStats};

/// Season whose team list backs the logo lookup. The model was trained on it.
pub const LOGO_SEASON: u16 = 2024;

// Canonical API-Football name -> spellings the prediction dataset uses.
const TEAM_NAME_ALIASES: &[(&str, &[&str])] = &[
    ("Manchester United", &["Man United", "Man Utd"]),
    ("Manchester City", &["Man City"]),
    ("Tottenham", &["Tottenham Hotspur"]),
    ("Newcastle", &["Newcastle United"]),
    ("Brighton", &["Brighton & Hove Albion"]),
    ("Nottingham Forest", &["Nott'ham Forest"]),
    ("Aston Villa", &["Aston Villa FC"]),
];

pub fn fetch_top6_predictions(cfg: &DashboardConfig) -> Result<Vec<PredictionRow>> {
    let client = http_client()?;
    let url = format!("{}/top6-predictions", cfg.prediction_base);
    debug!(%url, "prediction request");
    let body = fetch_json(client, &url, &[], cfg.use_cache).context("failed to fetch predictions")?;
    parse_top6_predictions_json(&body)
}

pub fn parse_top6_predictions_json(raw: &str) -> Result<Vec<PredictionRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid predictions json")?;
    let Some(items) = v.as_array() else {
        return Err(anyhow::anyhow!("predictions payload is not a list"));
    };
    Ok(items.iter().filter_map(parse_prediction_row).collect())
}

fn parse_prediction_row(v: &Value) -> Option<PredictionRow> {
    let team = v.get("team")?.as_str()?.trim();
    if team.is_empty() {
        return None;
    }
    // A zero or missing `probability` falls through to the raw model column.
    let probability = ["probability", "top_6_prob_2025"]
        .iter()
        .filter_map(|key| v.get(*key).and_then(Value::as_f64))
        .find(|p| *p != 0.0 && p.is_finite())
        .unwrap_or(0.0);
    Some(PredictionRow {
        team: team.to_string(),
        probability,
        current_points: v.get("current_points").and_then(Value::as_f64),
        current_goal_diff: v.get("current_goal_diff").and_then(Value::as_f64),
    })
}

pub fn probability_percent(probability: f64) -> i64 {
    (probability * 100.0).round() as i64
}

#[derive(Debug, Clone, Default)]
pub struct TeamLogoIndex {
    logos: HashMap<String, String>,
}

impl TeamLogoIndex {
    pub fn from_teams(teams: &[TeamRef]) -> Self {
        let logos = teams
            .iter()
            .filter_map(|t| Some((t.name.clone(), t.logo.clone()?)))
            .collect();
        Self { logos }
    }

    pub fn is_empty(&self) -> bool {
        self.logos.is_empty()
    }

    pub fn logo_for(&self, team_name: &str) -> Option<&str> {
        if let Some(logo) = self.logos.get(team_name) {
            return Some(logo.as_str());
        }
        TEAM_NAME_ALIASES
            .iter()
            .filter(|(_, aliases)| aliases.iter().any(|alias| *alias == team_name))
            .find_map(|(canonical, _)| self.logos.get(*canonical))
            .map(String::as_str)
    }
}

/// Two-letter badge shown when no logo is known.
pub fn team_initials(team_name: &str) -> String {
    team_name
        .trim()
        .chars()
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn team_season_stats_from_standings(rows: &[StandingRow], season: u16) -> Vec<TeamSeasonStats> {
    rows.iter()
        .map(|row| {
            let gf = to_i32(row.all.goals_for);
            let ga = to_i32(row.all.goals_against);
            TeamSeasonStats {
                team: row.team.name.clone(),
                points: to_i32(row.points),
                goal_diff: gf.saturating_sub(ga),
                goals_for: gf,
                goals_against: ga,
                wins: to_i32(row.all.win),
                draws: to_i32(row.all.draw),
                losses: to_i32(row.all.lose),
                season: i32::from(season),
            }
        })
        .collect()
}

fn to_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[derive(Debug, Deserialize)]
struct PredictResultWire {
    team: String,
    #[serde(default)]
    top6_probability: f64,
    #[serde(default)]
    top6_prediction: u8,
}

pub fn predict_top6(cfg: &DashboardConfig, teams: &[TeamSeasonStats]) -> Result<Vec<PredictResult>> {
    let client = http_client()?;
    let url = format!("{}/predict", cfg.prediction_base);
    debug!(%url, teams = teams.len(), "predict request");
    let resp = client
        .post(&url)
        .json(teams)
        .send()
        .context("predict request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading predict body")?;
    if !status.is_success() {
        return Err(http_error(status, &body));
    }
    parse_predict_results_json(&body)
}

pub fn parse_predict_results_json(raw: &str) -> Result<Vec<PredictResult>> {
    let rows: Vec<PredictResultWire> =
        serde_json::from_str(raw.trim()).context("invalid predict json")?;
    Ok(rows
        .into_iter()
        .map(|r| PredictResult {
            team: r.team,
            top6_probability: r.top6_probability,
            top6_prediction: r.top6_prediction,
        })
        .collect())
}
