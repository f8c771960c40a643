use std::cmp::Ordering;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pl_dashboard::api_football;
use pl_dashboard::config::DashboardConfig;
use pl_dashboard::involvements::top_goal_involvements;
use pl_dashboard::model::PlayerStatEntry;
use pl_dashboard::predictions::{self, TeamLogoIndex};
use pl_dashboard::team_stats;

const USAGE: &str = "usage: pl_dashboard <home|teams|team-stats|players|predictions|predict> \
[--league N] [--season YYYY] [--team ID] [--last N] [--limit N]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Home,
    Teams,
    TeamStats,
    Players,
    Predictions,
    Predict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cli {
    command: Command,
    league: Option<u32>,
    season: Option<u16>,
    team: Option<u32>,
    last: Option<u8>,
    limit: usize,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cli = parse_cli(&args)?;

    let mut cfg = DashboardConfig::from_env();
    if let Some(league) = cli.league {
        cfg.league_id = league;
    }
    if let Some(season) = cli.season {
        cfg.season = season;
    }
    if let Some(last) = cli.last {
        cfg.fixtures_last = last.clamp(1, 50);
    }
    info!(
        league = cfg.league_id,
        season = cfg.season,
        cache = cfg.use_cache,
        "config resolved"
    );

    match cli.command {
        Command::Home => run_home(&cfg),
        Command::Teams => run_teams(&cfg),
        Command::TeamStats => {
            let team = cli.team.context("team-stats needs --team ID")?;
            run_team_stats(&cfg, team)
        }
        Command::Players => run_players(&cfg, cli.limit),
        Command::Predictions => run_predictions(&cfg),
        Command::Predict => run_predict(&cfg),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let Some(first) = args.first() else {
        return Err(anyhow!("{USAGE}"));
    };
    let command = match first.as_str() {
        "home" => Command::Home,
        "teams" => Command::Teams,
        "team-stats" => Command::TeamStats,
        "players" => Command::Players,
        "predictions" => Command::Predictions,
        "predict" => Command::Predict,
        other => return Err(anyhow!("unknown command `{other}`\n{USAGE}")),
    };

    let mut cli = Cli {
        command,
        league: None,
        season: None,
        team: None,
        last: None,
        limit: pl_dashboard::involvements::DEFAULT_INVOLVEMENT_LIMIT,
    };

    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (arg.as_str(), None),
        };
        let mut value = || {
            inline
                .clone()
                .or_else(|| rest.next().cloned())
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{flag} needs a value"))
        };
        match flag {
            "--league" => cli.league = Some(parse_num(flag, &value()?)?),
            "--season" => cli.season = Some(parse_num(flag, &value()?)?),
            "--team" => cli.team = Some(parse_num(flag, &value()?)?),
            "--last" => cli.last = Some(parse_num(flag, &value()?)?),
            "--limit" => cli.limit = parse_num(flag, &value()?)?,
            other => return Err(anyhow!("unknown flag `{other}`\n{USAGE}")),
        }
    }
    Ok(cli)
}

fn parse_num<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| anyhow!("{flag}: `{raw}` is not a valid number"))
}

/// `2025` -> `2025/2026`. A season with no following year prints alone.
fn season_label(season: u16, sep: char) -> String {
    match season.checked_add(1) {
        Some(next) => format!("{season}{sep}{next}"),
        None => season.to_string(),
    }
}

fn run_home(cfg: &DashboardConfig) -> Result<()> {
    match api_football::fetch_league_logo(cfg) {
        Ok(Some(logo)) => println!("League logo: {logo}"),
        Ok(None) => {}
        Err(err) => warn!("league logo unavailable: {err:#}"),
    }

    let standings = api_football::fetch_standings(cfg).context("standings fetch failed")?;
    if standings.is_empty() {
        println!(
            "{} season data not available yet",
            season_label(cfg.season, '-')
        );
        println!("Data becomes available when the season starts.");
        return Ok(());
    }

    println!();
    println!("Standings {}", season_label(cfg.season, '/'));
    println!(
        "{:>3}  {:<26} {:>3} {:>4} {:>4}  {:<5}",
        "#", "Team", "P", "GD", "Pts", "Form"
    );
    for row in &standings {
        println!(
            "{:>3}  {:<26} {:>3} {:>+4} {:>4}  {:<5}",
            row.rank,
            row.team.name,
            row.all.played,
            row.goals_diff,
            row.points,
            row.form.as_deref().unwrap_or("")
        );
    }

    let fixtures = api_football::fetch_recent_fixtures(cfg).context("fixtures fetch failed")?;
    println!();
    println!("Last {} fixtures", fixtures.len());
    for m in &fixtures {
        let date = m
            .kickoff
            .map(|k| k.format("%d %b %Y").to_string())
            .unwrap_or_else(|| "TBD".to_string());
        println!(
            "{:<11}  {:>22} {:^7} {:<22}",
            date,
            m.home.name,
            m.score_line(),
            m.away.name
        );
    }
    Ok(())
}

fn run_teams(cfg: &DashboardConfig) -> Result<()> {
    let teams = api_football::fetch_teams(cfg).context("teams fetch failed")?;
    for team in &teams {
        println!("{:>6}  {}", team.id, team.name);
    }
    Ok(())
}

fn run_team_stats(cfg: &DashboardConfig, team_id: u32) -> Result<()> {
    let stats =
        api_football::fetch_team_statistics(cfg, team_id).context("team statistics fetch failed")?;
    let name = stats
        .team
        .as_ref()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| format!("team {team_id}"));
    println!("{name} ({})", season_label(cfg.season, '/'));
    if let Some(form) = stats.form.as_deref() {
        println!("Form: {form}");
    }

    println!();
    println!("{:<14} {:>5} {:>5}", "", "Home", "Away");
    for row in team_stats::performance_breakdown(&stats) {
        println!("{:<14} {:>5} {:>5}", row.category, row.home, row.away);
    }
    let totals = team_stats::record_totals(&stats);
    println!(
        "Total: {} W / {} D / {} L",
        totals.wins, totals.draws, totals.losses
    );

    let minutes = team_stats::goals_by_minute(&stats);
    if !minutes.is_empty() {
        println!();
        println!("Goals by minute");
        for (interval, goals) in minutes {
            println!("{interval:>8}  {goals:>3}  {}", "#".repeat(goals as usize));
        }
    }

    let formations = team_stats::formation_usage(&stats);
    if !formations.is_empty() {
        println!();
        println!("Formations");
        for (formation, played) in formations {
            println!("{formation:>10}  {played}");
        }
    }

    let pens = team_stats::penalty_record(&stats);
    println!();
    match pens.conversion_pct() {
        Some(pct) => println!(
            "Penalties: {} scored, {} missed ({pct:.0}%)",
            pens.scored, pens.missed
        ),
        None => println!("Penalties: none taken"),
    }
    if !stats.biggest_streak.is_empty() {
        let streaks = stats
            .biggest_streak
            .iter()
            .map(|(k, n)| format!("{k} {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Longest streaks: {streaks}");
    }
    Ok(())
}

fn run_players(cfg: &DashboardConfig, limit: usize) -> Result<()> {
    let top = api_football::fetch_top_players(cfg).context("player rankings fetch failed")?;

    print_ranking("Top Scorers", &top.scorers);
    print_ranking("Top Assists", &top.assists);

    println!();
    println!("Most Goal Involvements");
    for (idx, row) in top_goal_involvements(&top.scorers, &top.assists, limit)
        .iter()
        .enumerate()
    {
        println!(
            "{:>2}. {:<26} {:<22} {:>2} G {:>2} A  = {:<3} {}",
            idx + 1,
            row.player.name,
            row.team.name,
            row.goals,
            row.assists,
            row.total(),
            share_column(row.share_pct())
        );
    }
    Ok(())
}

fn share_column(split: Option<(u32, u32)>) -> String {
    match split {
        Some((goals, assists)) => format!("{goals}% G / {assists}% A"),
        None => "-".to_string(),
    }
}

fn print_ranking(title: &str, rows: &[PlayerStatEntry]) {
    println!();
    println!("{title}");
    for (idx, entry) in rows.iter().enumerate() {
        println!(
            "{:>2}. {:<26} {:<22} {:>3} {}",
            idx + 1,
            entry.player.name,
            entry.team.name,
            entry.stat(),
            entry.kind.label().to_ascii_lowercase()
        );
    }
}

fn run_predictions(cfg: &DashboardConfig) -> Result<()> {
    let rows = predictions::fetch_top6_predictions(cfg)?;

    let mut logo_cfg = cfg.clone();
    logo_cfg.season = predictions::LOGO_SEASON;
    let logos = match api_football::fetch_teams(&logo_cfg) {
        Ok(teams) => TeamLogoIndex::from_teams(&teams),
        Err(err) => {
            warn!("team logos unavailable: {err:#}");
            TeamLogoIndex::default()
        }
    };

    println!("Predicted top 6 for the upcoming season");
    for (idx, row) in rows.iter().enumerate() {
        let badge = logos
            .logo_for(&row.team)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("[{}]", predictions::team_initials(&row.team)));
        println!(
            "{:>2}. {:<24} {:>3}%  {}",
            idx + 1,
            row.team,
            predictions::probability_percent(row.probability),
            badge
        );
    }
    Ok(())
}

fn run_predict(cfg: &DashboardConfig) -> Result<()> {
    let standings = api_football::fetch_standings(cfg).context("standings fetch failed")?;
    if standings.is_empty() {
        return Err(anyhow!(
            "no standings for season {}, nothing to predict from",
            cfg.season
        ));
    }
    let input = predictions::team_season_stats_from_standings(&standings, cfg.season);
    let mut results = predictions::predict_top6(cfg, &input)?;
    results.sort_by(|a, b| {
        b.top6_probability
            .partial_cmp(&a.top6_probability)
            .unwrap_or(Ordering::Equal)
    });

    for (idx, r) in results.iter().enumerate() {
        let mark = if r.top6_prediction == 1 { "*" } else { " " };
        println!(
            "{:>2}. {mark} {:<24} {:>3}%",
            idx + 1,
            r.team,
            predictions::probability_percent(r.top6_probability)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_in_both_forms() {
        let cli = parse_cli(&args(&["team-stats", "--team", "42", "--season=2024"])).unwrap();
        assert_eq!(cli.command, Command::TeamStats);
        assert_eq!(cli.team, Some(42));
        assert_eq!(cli.season, Some(2024));
        assert_eq!(cli.limit, 5);
    }

    #[test]
    fn rejects_unknown_command_and_missing_value() {
        assert!(parse_cli(&args(&["standings"])).is_err());
        assert!(parse_cli(&args(&["players", "--limit"])).is_err());
        assert!(parse_cli(&[]).is_err());
    }

    #[test]
    fn season_label_spans_two_years() {
        assert_eq!(season_label(2025, '/'), "2025/2026");
        assert_eq!(season_label(2025, '-'), "2025-2026");
        assert_eq!(season_label(u16::MAX, '/'), "65535");
    }

    #[test]
    fn share_column_handles_zero_total() {
        assert_eq!(share_column(Some((57, 43))), "57% G / 43% A");
        assert_eq!(share_column(None), "-");
    }
}
