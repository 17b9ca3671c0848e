use crate::error::{Error, Result};
use std::path::PathBuf;

const DEFAULT_ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";
const DEFAULT_SPORT_KEY: &str = "americanfootball_nfl";
const DEFAULT_BOOKMAKERS: &str = "fanduel";
const DEFAULT_TOKEN_FILE: &str = "./odds-api-token.txt";
const DEFAULT_SCOREBOARD_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard";
const DEFAULT_SHEET_DIR: &str = "output";

/// Settings for The Odds API client
#[derive(Debug, Clone)]
pub struct OddsApiConfig {
    pub base_url: String,
    pub sport: String,
    pub regions: String,
    pub bookmakers: String,
    pub api_key_env: String,
    pub token_file: PathBuf,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ODDS_API_BASE_URL.to_string(),
            sport: DEFAULT_SPORT_KEY.to_string(),
            regions: "us".to_string(),
            bookmakers: DEFAULT_BOOKMAKERS.to_string(),
            api_key_env: "ODDS_API_KEY".to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

/// Settings for the ESPN scoreboard client
#[derive(Debug, Clone)]
pub struct EspnConfig {
    pub scoreboard_url: String,
}

impl Default for EspnConfig {
    fn default() -> Self {
        Self {
            scoreboard_url: DEFAULT_SCOREBOARD_URL.to_string(),
        }
    }
}

/// Where wager sheets are kept
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub dir: PathBuf,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_SHEET_DIR),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub odds_api: OddsApiConfig,
    pub espn: EspnConfig,
    pub sheets: SheetConfig,
}

impl Config {
    /// Build the configuration from defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(url) = lookup("ODDS_API_BASE_URL") {
            config.odds_api.base_url = url;
        }
        if let Some(bookmakers) = lookup("ODDS_API_BOOKMAKERS") {
            config.odds_api.bookmakers = bookmakers;
        }
        if let Some(path) = lookup("ODDS_API_TOKEN_FILE") {
            config.odds_api.token_file = PathBuf::from(path);
        }
        if let Some(url) = lookup("ESPN_SCOREBOARD_URL") {
            config.espn.scoreboard_url = url;
        }
        if let Some(dir) = lookup("SHEET_DIR") {
            config.sheets.dir = PathBuf::from(dir);
        }
        config
    }
}

/// API key for The Odds API, obtained once and handed to the client
#[derive(Clone)]
pub struct OddsApiToken(String);

impl OddsApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the key from the configured env var, falling back to the token file
    pub fn acquire(config: &OddsApiConfig) -> Result<Self> {
        if let Ok(key) = std::env::var(&config.api_key_env) {
            if !key.trim().is_empty() {
                return Ok(Self::new(key.trim()));
            }
        }
        let contents = std::fs::read_to_string(&config.token_file).map_err(|e| {
            Error::Credential(format!(
                "{} not set and token file {} unreadable: {}",
                config.api_key_env,
                config.token_file.display(),
                e
            ))
        })?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(Error::Credential(format!(
                "token file {} is empty",
                config.token_file.display()
            )));
        }
        Ok(Self::new(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for OddsApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OddsApiToken(***)")
    }
}
