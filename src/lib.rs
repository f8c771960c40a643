pub mod api_football;
pub mod config;
pub mod http_cache;
pub mod http_client;
pub mod involvements;
pub mod model;
pub mod predictions;
pub mod team_stats;
