use crate::config::EspnConfig;
use crate::error::{Error, Result};
use crate::models::{GameRecord, HomeAway, ScoreLine};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::debug;

const EVENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%MZ";
const REGULAR_SEASON_LABEL: &str = "Regular Season";
const STATUS_FINAL: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardResponse {
    #[serde(default)]
    pub leagues: Vec<League>,
    #[serde(default)]
    pub week: Option<WeekNumber>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct League {
    #[serde(default)]
    pub calendar: Vec<Calendar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Calendar {
    pub label: String,
    #[serde(default)]
    pub entries: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub label: String,
    pub value: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WeekNumber {
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub week: Option<WeekNumber>,
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Competition {
    pub status: Status,
    #[serde(default)]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(rename = "type")]
    pub status_type: StatusType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusType {
    #[serde(deserialize_with = "number_or_string")]
    pub id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Venue {
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub home_away: String,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub score: Option<u32>,
    #[serde(default)]
    pub team: Option<Team>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub display_name: String,
}

/// ESPN sends ids and scores as strings or as numbers depending on the endpoint
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u32),
    Text(String),
}

impl NumberOrString {
    fn into_number(self) -> std::result::Result<Option<u32>, std::num::ParseIntError> {
        match self {
            NumberOrString::Number(n) => Ok(Some(n)),
            NumberOrString::Text(s) if s.trim().is_empty() => Ok(None),
            NumberOrString::Text(s) => s.trim().parse().map(Some),
        }
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    NumberOrString::deserialize(deserializer)?
        .into_number()
        .map_err(serde::de::Error::custom)?
        .ok_or_else(|| serde::de::Error::custom("empty number"))
}

fn optional_number_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => value.into_number().map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Parse an ESPN timestamp such as `2022-11-24T17:30Z`
pub fn parse_espn_datetime(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, EVENT_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| Error::Timestamp {
            value: value.to_string(),
            source,
        })
}

pub fn parse_scoreboard(json: &str) -> Result<ScoreboardResponse> {
    Ok(serde_json::from_str(json)?)
}

/// Games of one regular season week, normalized from the scoreboard
#[derive(Debug, Clone)]
pub struct WeekSchedule {
    pub week: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub games: Vec<GameRecord>,
}

impl WeekSchedule {
    /// Normalize a scoreboard response
    ///
    /// `week` defaults to the one ESPN reports, then to the calendar week of
    /// the first listed kickoff.
    pub fn from_scoreboard(response: &ScoreboardResponse, week: Option<u32>) -> Result<Self> {
        let week = week
            .or_else(|| response.week.map(|w| w.number))
            .or_else(|| {
                let first = response.events.first()?;
                week_for_date(response, parse_espn_datetime(&first.date).ok()?)
            })
            .ok_or(Error::MissingField("week"))?;

        let entry = regular_season_entries(response)
            .find(|entry| entry.value == week.to_string())
            .ok_or(Error::UnknownWeek(week))?;
        let start = parse_espn_datetime(&entry.start_date)?;
        let end = parse_espn_datetime(&entry.end_date)?;

        let games = response
            .events
            .iter()
            .map(|event| game_from_event(event, week))
            .collect::<Result<Vec<_>>>()?;

        debug!("Week {} ({} - {}): {} games", week, start, end, games.len());
        Ok(Self {
            week,
            start,
            end,
            games,
        })
    }
}

fn regular_season_entries(response: &ScoreboardResponse) -> impl Iterator<Item = &CalendarEntry> {
    response
        .leagues
        .iter()
        .take(1)
        .flat_map(|league| league.calendar.iter())
        .filter(|calendar| calendar.label == REGULAR_SEASON_LABEL)
        .flat_map(|calendar| calendar.entries.iter())
}

/// Regular season week containing `date` (start inclusive, end exclusive)
pub fn week_for_date(response: &ScoreboardResponse, date: DateTime<Utc>) -> Option<u32> {
    regular_season_entries(response).find_map(|entry| {
        let start = parse_espn_datetime(&entry.start_date).ok()?;
        let end = parse_espn_datetime(&entry.end_date).ok()?;
        if date >= start && date < end {
            entry.value.parse().ok()
        } else {
            None
        }
    })
}

fn competitor<'a>(competition: &'a Competition, home_away: &str) -> Option<&'a Competitor> {
    competition
        .competitors
        .iter()
        .find(|c| c.home_away == home_away)
}

/// Final score of a competition, `None` until the game is over
pub fn score_from_competition(competition: &Competition) -> Option<ScoreLine> {
    if competition.status.status_type.id != STATUS_FINAL {
        return None;
    }
    let away = competitor(competition, "away")?.score?;
    let home = competitor(competition, "home")?.score?;
    Some(HomeAway::new(away, home))
}

fn location(venue: Option<&Venue>) -> String {
    match venue {
        Some(Venue {
            address: Address {
                city,
                state: Some(state),
            },
        }) => format!("{}, {}", city, state),
        Some(venue) => venue.address.city.clone(),
        None => String::new(),
    }
}

fn team_name(competition: &Competition, home_away: &'static str) -> Result<String> {
    competitor(competition, home_away)
        .and_then(|c| c.team.as_ref())
        .map(|team| team.display_name.clone())
        .ok_or(Error::MissingField(home_away))
}

fn game_from_event(event: &Event, week: u32) -> Result<GameRecord> {
    let competition = event
        .competitions
        .first()
        .ok_or(Error::MissingField("competition"))?;
    let teams = HomeAway::new(
        team_name(competition, "away")?,
        team_name(competition, "home")?,
    );

    let mut game = GameRecord::new(
        event.week.map_or(week, |w| w.number),
        parse_espn_datetime(&event.date)?,
        location(competition.venue.as_ref()),
        teams,
    );
    game.score = score_from_competition(competition);
    Ok(game)
}

pub struct EspnApiClient {
    config: EspnConfig,
    client: Client,
}

impl EspnApiClient {
    pub fn new(config: EspnConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Fetch the scoreboard for a week, or the current week when `None`
    pub async fn fetch_scoreboard(&self, week: Option<u32>) -> Result<ScoreboardResponse> {
        debug!("Querying ESPN scoreboard for week {:?}", week);
        let mut request = self.client.get(&self.config.scoreboard_url);
        if let Some(week) = week {
            request = request.query(&[("week", week)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Status {
                provider: "ESPN",
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }

    pub async fn fetch_week(&self, week: Option<u32>) -> Result<WeekSchedule> {
        let scoreboard = self.fetch_scoreboard(week).await?;
        WeekSchedule::from_scoreboard(&scoreboard, week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const COMPETITION_FINAL: &str = r#"{
        "status": {"type": {"id": 3}},
        "competitors": [
            {"homeAway": "away", "score": 31},
            {"homeAway": "home", "score": 30}
        ]
    }"#;

    const COMPETITION_IN_PROGRESS: &str = r#"{
        "status": {"type": {"id": "2"}},
        "competitors": [
            {"homeAway": "away", "score": "10"},
            {"homeAway": "home", "score": "24"}
        ]
    }"#;

    #[test]
    fn test_score_final() {
        let competition: Competition = serde_json::from_str(COMPETITION_FINAL).unwrap();
        assert_eq!(
            score_from_competition(&competition),
            Some(HomeAway::new(31, 30))
        );
    }

    #[test]
    fn test_score_in_progress_is_absent() {
        let competition: Competition = serde_json::from_str(COMPETITION_IN_PROGRESS).unwrap();
        assert_eq!(competition.competitors[1].score, Some(24));
        assert_eq!(score_from_competition(&competition), None);
    }

    #[test]
    fn test_parse_espn_datetime() {
        let date = parse_espn_datetime("2022-11-24T17:30Z").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2022, 11, 24, 17, 30, 0).unwrap());
        assert!(matches!(
            parse_espn_datetime("2022-11-24"),
            Err(Error::Timestamp { .. })
        ));
    }

    #[test]
    fn test_location_formats() {
        let with_state = Venue {
            address: Address {
                city: "Detroit".to_string(),
                state: Some("MI".to_string()),
            },
        };
        let without_state = Venue {
            address: Address {
                city: "London".to_string(),
                state: None,
            },
        };
        assert_eq!(location(Some(&with_state)), "Detroit, MI");
        assert_eq!(location(Some(&without_state)), "London");
        assert_eq!(location(None), "");
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_week() {
        let client = EspnApiClient::new(EspnConfig::default());
        let schedule = client.fetch_week(None).await.unwrap();
        assert!(!schedule.games.is_empty());
    }
}
