use std::env;

pub const DEFAULT_API_BASE: &str = "https://api-football-v1.p.rapidapi.com/v3";
pub const DEFAULT_API_HOST: &str = "api-football-v1.p.rapidapi.com";
pub const DEFAULT_PREDICTION_BASE: &str = "https://ml-silent-pine-9829.fly.dev";
pub const PREMIER_LEAGUE_ID: u32 = 39;
pub const DEFAULT_SEASON: u16 = 2025;
pub const DEFAULT_FIXTURES_LAST: u8 = 10;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base: String,
    pub api_host: String,
    pub api_key: Option<String>,
    pub prediction_base: String,
    pub league_id: u32,
    pub season: u16,
    pub fixtures_last: u8,
    pub use_cache: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: None,
            prediction_base: DEFAULT_PREDICTION_BASE.to_string(),
            league_id: PREMIER_LEAGUE_ID,
            season: DEFAULT_SEASON,
            fixtures_last: DEFAULT_FIXTURES_LAST,
            use_cache: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let d = Self::default();

        let api_key = get("VITE_API_KEY").or_else(|| get("API_FOOTBALL_KEY"));
        let api_host = get("VITE_API_HOST").unwrap_or(d.api_host);
        let api_base = get("API_FOOTBALL_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(d.api_base);
        let prediction_base = get("VITE_API_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(d.prediction_base);
        let league_id = get("PL_LEAGUE_ID")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(d.league_id);
        let season = get("PL_SEASON")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(d.season);
        let fixtures_last = get("PL_FIXTURES_LAST")
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(d.fixtures_last)
            .clamp(1, 50);
        let use_cache = get("HTTP_CACHE").map(|v| parse_bool(&v)).unwrap_or(true);

        Self {
            api_base,
            api_host,
            api_key,
            prediction_base,
            league_id,
            season,
            fixtures_last,
            use_cache,
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    let t = raw.trim().to_ascii_lowercase();
    !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
}
