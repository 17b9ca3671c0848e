pub mod espn_api;
pub mod odds_api;
