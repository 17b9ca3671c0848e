use crate::config::{OddsApiConfig, OddsApiToken};
use crate::error::{Error, Result};
use crate::models::{GameOdds, H2hOdds, HomeAway, MarketKind, SpreadOdds, TotalOdds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const OVER: &str = "Over";
const UNDER: &str = "Under";

/// A single game from The Odds API with every bookmaker's markets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    #[serde(default)]
    pub sport_title: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsBookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

/// Market data (h2h, spreads, totals) from The Odds API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

/// Outcome keyed by team name, or "Over"/"Under" for totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsOutcome {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

impl OddsMarket {
    fn outcome(&self, kind: MarketKind, name: &str) -> Result<&OddsOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.name == name)
            .ok_or_else(|| Error::MalformedMarket {
                market: kind,
                name: name.to_string(),
            })
    }

    fn point(&self, kind: MarketKind, name: &str) -> Result<f64> {
        self.outcome(kind, name)?
            .point
            .ok_or_else(|| Error::MalformedMarket {
                market: kind,
                name: format!("{} point", name),
            })
    }

    fn price(&self, kind: MarketKind, name: &str) -> Result<i32> {
        Ok(self.outcome(kind, name)?.price.round() as i32)
    }
}

impl OddsEvent {
    pub fn matches(&self, teams: &HomeAway<String>) -> bool {
        self.away_team == teams.away && self.home_team == teams.home
    }

    fn market(&self, kind: MarketKind) -> Option<&OddsMarket> {
        self.bookmakers
            .first()?
            .markets
            .iter()
            .find(|market| market.key == kind.api_key())
    }

    /// Odds from the first bookmaker, `None` when no bookmaker quoted the game
    pub fn game_odds(&self) -> Result<Option<GameOdds>> {
        if self.bookmakers.is_empty() {
            return Ok(None);
        }
        let away = self.away_team.as_str();
        let home = self.home_team.as_str();

        let h2h = match self.market(MarketKind::H2h) {
            Some(market) => {
                let kind = MarketKind::H2h;
                let price = HomeAway::new(market.price(kind, away)?, market.price(kind, home)?);
                Some(H2hOdds::new(price, ()))
            }
            None => None,
        };

        let spread = match self.market(MarketKind::Spread) {
            Some(market) => {
                let kind = MarketKind::Spread;
                let price = HomeAway::new(market.price(kind, away)?, market.price(kind, home)?);
                let points = HomeAway::new(market.point(kind, away)?, market.point(kind, home)?);
                Some(SpreadOdds::new(price, points))
            }
            None => None,
        };

        let total = match self.market(MarketKind::Total) {
            Some(market) => {
                let kind = MarketKind::Total;
                let price = HomeAway::new(market.price(kind, UNDER)?, market.price(kind, OVER)?);
                Some(TotalOdds::new(price, market.point(kind, UNDER)?))
            }
            None => None,
        };

        Ok(Some(GameOdds { h2h, spread, total }))
    }
}

/// Keep events that start strictly inside the window
pub fn filter_window(
    events: Vec<OddsEvent>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<OddsEvent> {
    events
        .into_iter()
        .filter(|event| event.commence_time > start && event.commence_time < end)
        .collect()
}

pub fn parse_odds_events(json: &str) -> Result<Vec<OddsEvent>> {
    Ok(serde_json::from_str(json)?)
}

pub struct OddsApiClient {
    config: OddsApiConfig,
    token: OddsApiToken,
    client: reqwest::Client,
}

impl OddsApiClient {
    pub fn new(config: OddsApiConfig, token: OddsApiToken) -> Self {
        Self {
            config,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch NFL odds for every upcoming game the bookmakers list
    pub async fn fetch_events(&self) -> Result<Vec<OddsEvent>> {
        let url = format!(
            "{}/sports/{}/odds",
            self.config.base_url, self.config.sport
        );
        let markets = MarketKind::ALL.map(MarketKind::api_key).join(",");

        debug!("Querying The Odds API for {} odds", self.config.sport);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.token.as_str()),
                ("regions", self.config.regions.as_str()),
                ("markets", markets.as_str()),
                ("oddsFormat", "american"),
                ("dateFormat", "iso"),
                ("bookmakers", self.config.bookmakers.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status {
                provider: "The Odds API",
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch odds for games starting inside a week's window
    pub async fn fetch_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OddsEvent>> {
        let events = self.fetch_events().await?;
        debug!("Filter odds data for dates {} - {}", start, end);
        Ok(filter_window(events, start, end))
    }

    /// Check how many API requests you have remaining
    pub async fn check_usage(&self) -> Result<ApiUsage> {
        let url = format!("{}/sports", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.token.as_str())])
            .send()
            .await?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let usage = ApiUsage {
            remaining: header("x-requests-remaining"),
            used: header("x-requests-used"),
        };
        info!("Odds API usage: {}", usage);
        Ok(usage)
    }
}

/// Request quota reported by The Odds API response headers
#[derive(Debug, Clone, Default)]
pub struct ApiUsage {
    pub remaining: Option<String>,
    pub used: Option<String>,
}

impl std::fmt::Display for ApiUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requests remaining, {} used",
            self.remaining.as_deref().unwrap_or("?"),
            self.used.as_deref().unwrap_or("?")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EVENT: &str = r#"{
        "id": "abc",
        "sport_title": "NFL",
        "commence_time": "2022-11-24T17:30:00Z",
        "home_team": "Team H",
        "away_team": "Team A",
        "bookmakers": [{
            "key": "fanduel",
            "title": "FanDuel",
            "last_update": "2022-11-24T12:00:00Z",
            "markets": [
                {"key": "h2h", "outcomes": [
                    {"name": "Team A", "price": 160},
                    {"name": "Team H", "price": -190}
                ]},
                {"key": "spreads", "outcomes": [
                    {"name": "Team A", "price": -110, "point": 3.5},
                    {"name": "Team H", "price": -110, "point": -3.5}
                ]},
                {"key": "totals", "outcomes": [
                    {"name": "Over", "price": -112, "point": 40.5},
                    {"name": "Under", "price": -108, "point": 40.5}
                ]}
            ]
        }]
    }"#;

    #[test]
    fn test_game_odds_from_first_bookmaker() {
        let event: OddsEvent = serde_json::from_str(EVENT).unwrap();
        let odds = event.game_odds().unwrap().unwrap();

        let h2h = odds.h2h.unwrap();
        assert_eq!(h2h.quote.price, HomeAway::new(160, -190));

        let spread = odds.spread.unwrap();
        assert_eq!(spread.quote.price, HomeAway::new(-110, -110));
        assert_eq!(spread.quote.points, HomeAway::new(3.5, -3.5));

        let total = odds.total.unwrap();
        assert_eq!(*total.quote.price.under(), -108);
        assert_eq!(*total.quote.price.over(), -112);
        assert_eq!(total.quote.points, 40.5);
    }

    #[test]
    fn test_no_bookmakers_means_no_odds() {
        let mut event: OddsEvent = serde_json::from_str(EVENT).unwrap();
        event.bookmakers.clear();
        assert!(event.game_odds().unwrap().is_none());
    }

    #[test]
    fn test_missing_outcome_is_malformed() {
        let mut event: OddsEvent = serde_json::from_str(EVENT).unwrap();
        event.bookmakers[0].markets[1].outcomes.pop();
        match event.game_odds() {
            Err(Error::MalformedMarket { market, name }) => {
                assert_eq!(market, MarketKind::Spread);
                assert_eq!(name, "Team H");
            }
            other => panic!("expected malformed market, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_market_is_absent() {
        let mut event: OddsEvent = serde_json::from_str(EVENT).unwrap();
        event.bookmakers[0].markets.retain(|m| m.key != "totals");
        let odds = event.game_odds().unwrap().unwrap();
        assert!(odds.h2h.is_some());
        assert!(odds.total.is_none());
    }

    #[test]
    fn test_filter_window_is_strict() {
        let event: OddsEvent = serde_json::from_str(EVENT).unwrap();
        let kickoff = event.commence_time;
        let start = Utc.with_ymd_and_hms(2022, 11, 23, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 11, 30, 7, 59, 0).unwrap();

        assert_eq!(filter_window(vec![event.clone()], start, end).len(), 1);
        assert!(filter_window(vec![event.clone()], kickoff, end).is_empty());
        assert!(filter_window(vec![event], start, kickoff).is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_events() {
        dotenv::dotenv().ok();
        let config = OddsApiConfig::default();
        let token = OddsApiToken::acquire(&config).unwrap();
        let client = OddsApiClient::new(config, token);

        let events = client.fetch_events().await.unwrap();
        assert!(!events.is_empty());
    }
}
