use crate::api::espn_api::WeekSchedule;
use crate::api::odds_api::OddsEvent;
use crate::error::Result;
use crate::models::{GameRecord, SettlementResult};
use crate::utils::settlement::settle_all;
use crate::utils::sheet::SheetRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// All games of one NFL week with their odds, wagers, and results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NflWeek {
    pub week: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub games: Vec<GameRecord>,
    pub settlement: Option<SettlementResult>,
}

impl NflWeek {
    /// Combine a week's schedule with whatever odds events match its games
    pub fn assemble(schedule: WeekSchedule, odds_events: &[OddsEvent]) -> Result<Self> {
        let mut games = schedule.games;
        for game in games.iter_mut() {
            match odds_events.iter().find(|event| event.matches(&game.teams)) {
                Some(event) => game.odds = event.game_odds()?,
                None => debug!(
                    "Did not find odds for {} at {}",
                    game.teams.away, game.teams.home
                ),
            }
        }

        Ok(Self {
            week: schedule.week,
            start: schedule.start,
            end: schedule.end,
            games,
            settlement: None,
        })
    }

    pub fn game(&self, away_team: &str, home_team: &str) -> Option<&GameRecord> {
        self.games
            .iter()
            .find(|game| game.matches(away_team, home_team))
    }

    /// Attach stakes from sheet rows; returns how many games were matched
    pub fn apply_wagers(&mut self, rows: &[SheetRow]) -> usize {
        let mut matched = 0;
        for game in self.games.iter_mut() {
            match rows.iter().find(|row| row.matches(game)) {
                Some(row) => {
                    row.apply_to(game);
                    matched += 1;
                }
                None => debug!(
                    "Cannot set bets for {} at {}: no bet data",
                    game.teams.away, game.teams.home
                ),
            }
        }
        info!("Applied wagers to {} of {} games", matched, self.games.len());
        matched
    }

    /// Copy final scores from a fresh schedule of the same week
    ///
    /// A game missing or not yet final in `schedule` keeps the score it has.
    pub fn update_scores(&mut self, schedule: &WeekSchedule) {
        for game in self.games.iter_mut() {
            let latest = schedule
                .games
                .iter()
                .find(|latest| latest.matches(&game.teams.away, &game.teams.home));
            if let Some(latest) = latest.filter(|latest| latest.is_final()) {
                game.score = latest.score;
            }
        }
    }

    /// Settle every game and store the week's aggregate
    pub fn settle(&mut self) -> SettlementResult {
        let total = settle_all(&mut self.games);
        let settled = self.games.iter().filter(|g| g.settlement.is_some()).count();
        info!(
            "Week {}: settled {} of {} games, {}",
            self.week,
            settled,
            self.games.len(),
            total
        );
        self.settlement = Some(total);
        total
    }

    pub fn to_rows(&self) -> Vec<SheetRow> {
        self.games.iter().map(SheetRow::from_game).collect()
    }
}

impl fmt::Display for NflWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut games: Vec<&GameRecord> = self.games.iter().collect();
        games.sort_by_key(|game| game.kickoff);
        for game in games {
            writeln!(f, "{}\n", game)?;
        }
        match self.settlement {
            Some(total) => write!(f, "Week {} Results: {}", self.week, total),
            None => write!(f, "Week {} Results: -", self.week),
        }
    }
}
