use crate::utils::format::{format_money, format_price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Index, IndexMut};

/// Away or home designation of a team within a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Away,
    Home,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Away, Side::Home];

    pub fn opposite(self) -> Side {
        match self {
            Side::Away => Side::Home,
            Side::Home => Side::Away,
        }
    }
}

/// A value held once per side of a game
///
/// For the total market the slots are reused: `away` is the under and
/// `home` is the over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeAway<T> {
    pub away: T,
    pub home: T,
}

impl<T> HomeAway<T> {
    pub fn new(away: T, home: T) -> Self {
        Self { away, home }
    }

    /// Under slot of a total market
    pub fn under(&self) -> &T {
        &self.away
    }

    /// Over slot of a total market
    pub fn over(&self) -> &T {
        &self.home
    }
}

impl<T> Index<Side> for HomeAway<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }
}

impl<T> IndexMut<Side> for HomeAway<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Away => &mut self.away,
            Side::Home => &mut self.home,
        }
    }
}

/// Final score of a completed game
pub type ScoreLine = HomeAway<u32>;

/// Stake per side; `0.0` means no wager on that side
pub type WagerAmount = HomeAway<f64>;

impl WagerAmount {
    pub fn any(&self) -> bool {
        self.away > 0.0 || self.home > 0.0
    }
}

/// The three markets a game can be quoted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    H2h,
    Spread,
    Total,
}

impl MarketKind {
    pub const ALL: [MarketKind; 3] = [MarketKind::H2h, MarketKind::Spread, MarketKind::Total];

    /// Market key used by The Odds API
    pub fn api_key(self) -> &'static str {
        match self {
            MarketKind::H2h => "h2h",
            MarketKind::Spread => "spreads",
            MarketKind::Total => "totals",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketKind::H2h => "H2H",
            MarketKind::Spread => "ATS",
            MarketKind::Total => "O/U",
        };
        f.write_str(label)
    }
}

/// Quote for a single market
///
/// Prices are American odds, `0` meaning no price was recorded. `points`
/// carries the line: nothing for moneyline, one handicap per side for the
/// spread, a single line for the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote<P> {
    pub price: HomeAway<i32>,
    pub points: P,
}

/// Quote, stakes, and (once settled) the result for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds<P> {
    pub quote: MarketQuote<P>,
    pub wager: WagerAmount,
    pub result: Option<SettlementResult>,
}

impl<P> MarketOdds<P> {
    pub fn new(price: HomeAway<i32>, points: P) -> Self {
        Self {
            quote: MarketQuote { price, points },
            wager: WagerAmount::default(),
            result: None,
        }
    }

    pub fn with_wager(mut self, wager: WagerAmount) -> Self {
        self.wager = wager;
        self
    }
}

pub type H2hOdds = MarketOdds<()>;
pub type SpreadOdds = MarketOdds<HomeAway<f64>>;
pub type TotalOdds = MarketOdds<f64>;

/// Odds for every market offered on a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameOdds {
    pub h2h: Option<H2hOdds>,
    pub spread: Option<SpreadOdds>,
    pub total: Option<TotalOdds>,
}

impl GameOdds {
    fn price(&self, kind: MarketKind) -> Option<HomeAway<i32>> {
        match kind {
            MarketKind::H2h => self.h2h.as_ref().map(|m| m.quote.price),
            MarketKind::Spread => self.spread.as_ref().map(|m| m.quote.price),
            MarketKind::Total => self.total.as_ref().map(|m| m.quote.price),
        }
    }

    fn wager(&self, kind: MarketKind) -> Option<WagerAmount> {
        match kind {
            MarketKind::H2h => self.h2h.as_ref().map(|m| m.wager),
            MarketKind::Spread => self.spread.as_ref().map(|m| m.wager),
            MarketKind::Total => self.total.as_ref().map(|m| m.wager),
        }
    }

    fn result(&self, kind: MarketKind) -> Option<SettlementResult> {
        match kind {
            MarketKind::H2h => self.h2h.as_ref().and_then(|m| m.result),
            MarketKind::Spread => self.spread.as_ref().and_then(|m| m.result),
            MarketKind::Total => self.total.as_ref().and_then(|m| m.result),
        }
    }

    /// Set the stakes on a market, if that market is offered
    pub fn set_wager(&mut self, kind: MarketKind, wager: WagerAmount) -> bool {
        let slot = match kind {
            MarketKind::H2h => self.h2h.as_mut().map(|m| &mut m.wager),
            MarketKind::Spread => self.spread.as_mut().map(|m| &mut m.wager),
            MarketKind::Total => self.total.as_mut().map(|m| &mut m.wager),
        };
        match slot {
            Some(slot) => {
                *slot = wager;
                true
            }
            None => false,
        }
    }
}

/// Tally of settled wagers and their net monetary result
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub net: f64,
}

impl SettlementResult {
    pub fn new(wins: u32, losses: u32, pushes: u32, net: f64) -> Self {
        Self {
            wins,
            losses,
            pushes,
            net,
        }
    }

    pub fn push() -> Self {
        Self::new(0, 0, 1, 0.0)
    }

    /// Combine with a possibly absent result; absent is a no-op
    pub fn combine(self, other: Option<&SettlementResult>) -> Self {
        match other {
            Some(other) => self + *other,
            None => self,
        }
    }
}

impl Add for SettlementResult {
    type Output = SettlementResult;

    fn add(self, rhs: SettlementResult) -> SettlementResult {
        SettlementResult {
            wins: self.wins + rhs.wins,
            losses: self.losses + rhs.losses,
            pushes: self.pushes + rhs.pushes,
            net: self.net + rhs.net,
        }
    }
}

impl AddAssign for SettlementResult {
    fn add_assign(&mut self, rhs: SettlementResult) {
        *self = *self + rhs;
    }
}

impl Sum for SettlementResult {
    fn sum<I: Iterator<Item = SettlementResult>>(iter: I) -> Self {
        iter.fold(SettlementResult::default(), Add::add)
    }
}

impl<'a> Sum<&'a SettlementResult> for SettlementResult {
    fn sum<I: Iterator<Item = &'a SettlementResult>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for SettlementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} {}",
            self.wins,
            self.losses,
            self.pushes,
            format_money(self.net)
        )
    }
}

/// One NFL game with everything known about it so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub week: u32,
    pub kickoff: DateTime<Utc>,
    pub location: String,
    pub teams: HomeAway<String>,
    pub score: Option<ScoreLine>,
    pub odds: Option<GameOdds>,
    pub settlement: Option<SettlementResult>,
}

impl GameRecord {
    pub fn new(
        week: u32,
        kickoff: DateTime<Utc>,
        location: impl Into<String>,
        teams: HomeAway<String>,
    ) -> Self {
        Self {
            week,
            kickoff,
            location: location.into(),
            teams,
            score: None,
            odds: None,
            settlement: None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.score.is_some()
    }

    pub fn matches(&self, away_team: &str, home_team: &str) -> bool {
        self.teams.away == away_team && self.teams.home == home_team
    }

    /// American price on a side of a market, `0` when not quoted
    pub fn price(&self, kind: MarketKind, side: Side) -> i32 {
        self.odds
            .as_ref()
            .and_then(|odds| odds.price(kind))
            .map_or(0, |price| price[side])
    }

    /// Stake on a side of a market, `0.0` when no wager was placed
    pub fn stake(&self, kind: MarketKind, side: Side) -> f64 {
        self.odds
            .as_ref()
            .and_then(|odds| odds.wager(kind))
            .map_or(0.0, |wager| wager[side])
    }

    pub fn spread_points(&self, side: Side) -> Option<f64> {
        self.odds
            .as_ref()
            .and_then(|odds| odds.spread.as_ref())
            .map(|spread| spread.quote.points[side])
    }

    pub fn total_points(&self) -> Option<f64> {
        self.odds
            .as_ref()
            .and_then(|odds| odds.total.as_ref())
            .map(|total| total.quote.points)
    }

    pub fn market_result(&self, kind: MarketKind) -> Option<SettlementResult> {
        self.odds.as_ref().and_then(|odds| odds.result(kind))
    }

    pub fn score_for(&self, side: Side) -> Option<u32> {
        self.score.map(|score| score[side])
    }
}

fn stake_suffix(stake: f64) -> String {
    if stake > 0.0 {
        format!(" {}", format_money(stake))
    } else {
        String::new()
    }
}

fn results_suffix<P>(market: &MarketOdds<P>) -> String {
    match market.result {
        Some(result) if market.wager.any() => format!(" | Results: {}", result),
        _ => String::new(),
    }
}

impl fmt::Display for H2hOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} | {}{}{}",
            format_price(self.quote.price.away),
            stake_suffix(self.wager.away),
            format_price(self.quote.price.home),
            stake_suffix(self.wager.home),
            results_suffix(self)
        )
    }
}

impl fmt::Display for SpreadOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:+.1} ({}){} | {:+.1} ({}){}{}",
            self.quote.points.away,
            format_price(self.quote.price.away),
            stake_suffix(self.wager.away),
            self.quote.points.home,
            format_price(self.quote.price.home),
            stake_suffix(self.wager.home),
            results_suffix(self)
        )
    }
}

impl fmt::Display for TotalOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} | U {}{} | O {}{}{}",
            self.quote.points,
            format_price(*self.quote.price.under()),
            stake_suffix(*self.wager.under()),
            format_price(*self.quote.price.over()),
            stake_suffix(*self.wager.over()),
            results_suffix(self)
        )
    }
}

fn write_market<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    kind: MarketKind,
    market: Option<&T>,
) -> fmt::Result {
    match market {
        Some(market) => writeln!(f, "{}: {}", kind, market),
        None => writeln!(f, "{}: -", kind),
    }
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = |side: Side| {
            self.score_for(side)
                .map(|points| format!(" {}", points))
                .unwrap_or_default()
        };
        writeln!(
            f,
            "Week {} ({})",
            self.week,
            self.kickoff.format("%Y-%m-%d %I:%M %p")
        )?;
        writeln!(
            f,
            "{}{} at {}{}",
            self.teams.away,
            score(Side::Away),
            self.teams.home,
            score(Side::Home)
        )?;
        match &self.odds {
            Some(odds) => {
                write_market(f, MarketKind::H2h, odds.h2h.as_ref())?;
                write_market(f, MarketKind::Spread, odds.spread.as_ref())?;
                write_market(f, MarketKind::Total, odds.total.as_ref())?;
            }
            None => writeln!(f, "No odds")?,
        }
        match &self.settlement {
            Some(result) => write!(f, "Results: {}", result),
            None => write!(f, "Results: -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_game() -> GameRecord {
        GameRecord::new(
            12,
            Utc.with_ymd_and_hms(2022, 11, 24, 17, 30, 0).unwrap(),
            "Detroit, MI",
            HomeAway::new("Buffalo Bills".to_string(), "Detroit Lions".to_string()),
        )
    }

    #[test]
    fn test_combination_identity() {
        let r = SettlementResult::new(3, 1, 0, 42.5);
        assert_eq!(SettlementResult::default() + r, r);
        assert_eq!(r + SettlementResult::default(), r);
        assert_eq!(r.combine(None), r);
    }

    #[test]
    fn test_combination_sums_every_field() {
        let a = SettlementResult::new(1, 0, 0, 90.91);
        let b = SettlementResult::new(0, 2, 1, -50.0);
        let total: SettlementResult = [a, b].iter().sum();
        assert_eq!(total.wins, 1);
        assert_eq!(total.losses, 2);
        assert_eq!(total.pushes, 1);
        assert!((total.net - 40.91).abs() < 1e-9);
        assert_eq!(a + b, b + a);
    }

    #[test]
    fn test_settlement_result_display() {
        assert_eq!(SettlementResult::new(3, 1, 0, 42.5).to_string(), "3-1-0 $42.50");
        assert_eq!(SettlementResult::new(0, 2, 0, -15.0).to_string(), "0-2-0 -$15.00");
        assert_eq!(
            SettlementResult::new(10, 4, 1, 1234.5).to_string(),
            "10-4-1 $1,234.50"
        );
    }

    #[test]
    fn test_home_away_index() {
        let mut prices = HomeAway::new(160, -190);
        assert_eq!(prices[Side::Away], 160);
        assert_eq!(prices[Side::Home], -190);
        prices[Side::Home] = -200;
        assert_eq!(prices.home, -200);
        assert_eq!(Side::Away.opposite(), Side::Home);
    }

    #[test]
    fn test_accessors_default_when_absent() {
        let game = sample_game();
        assert_eq!(game.price(MarketKind::H2h, Side::Away), 0);
        assert_eq!(game.stake(MarketKind::Total, Side::Home), 0.0);
        assert_eq!(game.spread_points(Side::Away), None);
        assert_eq!(game.total_points(), None);
        assert_eq!(game.market_result(MarketKind::Spread), None);
        assert!(!game.is_final());
    }

    #[test]
    fn test_accessors_read_nested_odds() {
        let mut game = sample_game();
        game.odds = Some(GameOdds {
            h2h: Some(H2hOdds::new(HomeAway::new(160, -190), ())),
            spread: Some(
                SpreadOdds::new(HomeAway::new(-110, -110), HomeAway::new(3.5, -3.5))
                    .with_wager(HomeAway::new(150.0, 0.0)),
            ),
            total: None,
        });
        assert_eq!(game.price(MarketKind::H2h, Side::Home), -190);
        assert_eq!(game.stake(MarketKind::Spread, Side::Away), 150.0);
        assert_eq!(game.spread_points(Side::Home), Some(-3.5));
        assert_eq!(game.price(MarketKind::Total, Side::Home), 0);
    }

    #[test]
    fn test_set_wager_requires_market() {
        let mut odds = GameOdds {
            h2h: Some(H2hOdds::new(HomeAway::new(160, -190), ())),
            ..Default::default()
        };
        assert!(odds.set_wager(MarketKind::H2h, HomeAway::new(100.0, 50.0)));
        assert!(!odds.set_wager(MarketKind::Total, HomeAway::new(0.0, 10.0)));
        assert_eq!(odds.h2h.map(|m| m.wager.home), Some(50.0));
    }

    #[test]
    fn test_game_display() {
        let mut game = sample_game();
        game.score = Some(HomeAway::new(31, 30));
        let text = game.to_string();
        assert!(text.starts_with("Week 12 (2022-11-24 05:30 PM)\n"));
        assert!(text.contains("Buffalo Bills 31 at Detroit Lions 30"));
        assert!(text.contains("No odds"));
        assert!(text.ends_with("Results: -"));
    }

    #[test]
    fn test_total_display_uses_under_over_slots() {
        let total = TotalOdds::new(HomeAway::new(-108, -112), 40.5)
            .with_wager(HomeAway::new(1500.0, 0.0));
        assert_eq!(total.to_string(), "40.5 | U -108 $1,500.00 | O -112");
    }
}
