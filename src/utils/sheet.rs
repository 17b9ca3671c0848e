use crate::error::Result;
use crate::models::{
    GameOdds, GameRecord, H2hOdds, HomeAway, MarketKind, Side, SpreadOdds, TotalOdds,
    WagerAmount,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;

/// Blank price and bet cells read as `0`
fn blank_as_zero<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One game as a flat spreadsheet row
///
/// Prices and bets default to `0`, points are empty when the market was not
/// offered. The trailing score and result columns are filled in on export
/// and ignored on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub week: u32,
    pub away_team: String,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub away_team_h2h_price: i32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub away_team_h2h_bet: f64,
    pub home_team: String,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub home_team_h2h_price: i32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub home_team_h2h_bet: f64,
    #[serde(default)]
    pub away_team_spread: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub away_team_spread_price: i32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub away_team_spread_bet: f64,
    #[serde(default)]
    pub home_team_spread: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub home_team_spread_price: i32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub home_team_spread_bet: f64,
    #[serde(default)]
    pub over_under: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub over_price: i32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub over_bet: f64,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub under_price: i32,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub under_bet: f64,
    #[serde(default)]
    pub away_team_score: Option<u32>,
    #[serde(default)]
    pub home_team_score: Option<u32>,
    #[serde(default)]
    pub wins: Option<u32>,
    #[serde(default)]
    pub losses: Option<u32>,
    #[serde(default)]
    pub pushes: Option<u32>,
    #[serde(default)]
    pub net: Option<f64>,
}

impl SheetRow {
    pub fn from_game(game: &GameRecord) -> Self {
        use MarketKind::{H2h, Spread, Total};
        use Side::{Away, Home};

        Self {
            week: game.week,
            away_team: game.teams.away.clone(),
            away_team_h2h_price: game.price(H2h, Away),
            away_team_h2h_bet: game.stake(H2h, Away),
            home_team: game.teams.home.clone(),
            home_team_h2h_price: game.price(H2h, Home),
            home_team_h2h_bet: game.stake(H2h, Home),
            away_team_spread: game.spread_points(Away),
            away_team_spread_price: game.price(Spread, Away),
            away_team_spread_bet: game.stake(Spread, Away),
            home_team_spread: game.spread_points(Home),
            home_team_spread_price: game.price(Spread, Home),
            home_team_spread_bet: game.stake(Spread, Home),
            over_under: game.total_points(),
            over_price: game.price(Total, Home),
            over_bet: game.stake(Total, Home),
            under_price: game.price(Total, Away),
            under_bet: game.stake(Total, Away),
            away_team_score: game.score_for(Away),
            home_team_score: game.score_for(Home),
            wins: game.settlement.map(|r| r.wins),
            losses: game.settlement.map(|r| r.losses),
            pushes: game.settlement.map(|r| r.pushes),
            net: game.settlement.map(|r| r.net),
        }
    }

    pub fn matches(&self, game: &GameRecord) -> bool {
        game.matches(&self.away_team, &self.home_team)
    }

    /// Odds as recorded in the row
    ///
    /// Moneyline is always present; spread needs both handicaps and total
    /// needs the line.
    pub fn odds(&self) -> GameOdds {
        let h2h = H2hOdds::new(
            HomeAway::new(self.away_team_h2h_price, self.home_team_h2h_price),
            (),
        );
        let spread = match (self.away_team_spread, self.home_team_spread) {
            (Some(away), Some(home)) => Some(SpreadOdds::new(
                HomeAway::new(self.away_team_spread_price, self.home_team_spread_price),
                HomeAway::new(away, home),
            )),
            _ => None,
        };
        let total = self.over_under.map(|line| {
            TotalOdds::new(HomeAway::new(self.under_price, self.over_price), line)
        });
        GameOdds {
            h2h: Some(h2h),
            spread,
            total,
        }
    }

    pub fn wager(&self, kind: MarketKind) -> WagerAmount {
        match kind {
            MarketKind::H2h => HomeAway::new(self.away_team_h2h_bet, self.home_team_h2h_bet),
            MarketKind::Spread => {
                HomeAway::new(self.away_team_spread_bet, self.home_team_spread_bet)
            }
            MarketKind::Total => HomeAway::new(self.under_bet, self.over_bet),
        }
    }

    /// Attach this row's stakes to a game, taking odds from the row if the
    /// game has none yet
    pub fn apply_to(&self, game: &mut GameRecord) {
        let odds = game.odds.get_or_insert_with(|| {
            debug!(
                "Setting odds for {} at {} from sheet data",
                self.away_team, self.home_team
            );
            self.odds()
        });
        for kind in MarketKind::ALL {
            if !odds.set_wager(kind, self.wager(kind)) {
                debug!(
                    "Cannot set {} bets for {} at {}: no {} odds",
                    kind, self.away_team, self.home_team, kind
                );
            }
        }
    }
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<SheetRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<SheetRow>, csv::Error>>()?;
    Ok(rows)
}

pub fn write_rows<W: Write>(writer: W, rows: &[SheetRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Tabular storage for wager sheets
pub trait SheetStore {
    fn read_sheet(&self, name: &str) -> Result<Vec<SheetRow>>;
    fn write_sheet(&self, name: &str, rows: &[SheetRow]) -> Result<()>;
}

/// Sheets kept as `{dir}/{name}.csv`
#[derive(Debug, Clone)]
pub struct CsvSheetStore {
    dir: PathBuf,
}

impl CsvSheetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl SheetStore for CsvSheetStore {
    fn read_sheet(&self, name: &str) -> Result<Vec<SheetRow>> {
        let path = self.path(name);
        debug!("Reading sheet {}", path.display());
        read_rows(std::fs::File::open(path)?)
    }

    fn write_sheet(&self, name: &str, rows: &[SheetRow]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        debug!("Writing {} rows to sheet {}", rows.len(), path.display());
        write_rows(std::fs::File::create(path)?, rows)
    }
}
