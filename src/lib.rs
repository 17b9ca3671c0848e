pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::*;
pub use error::{Error, Result};
pub use models::*;
pub use utils::*;

use api::espn_api::EspnApiClient;
use api::odds_api::OddsApiClient;
use tracing::info;
use utils::sheet::SheetStore;
use utils::week::NflWeek;

/// Fetch a week's schedule and the odds for games inside its window
pub async fn fetch_week(
    espn_client: &EspnApiClient,
    odds_client: &OddsApiClient,
    week: Option<u32>,
) -> Result<NflWeek> {
    let schedule = espn_client.fetch_week(week).await?;
    let events = odds_client
        .fetch_events_between(schedule.start, schedule.end)
        .await?;
    info!(
        "Week {}: {} games, {} odds events",
        schedule.week,
        schedule.games.len(),
        events.len()
    );
    NflWeek::assemble(schedule, &events)
}

/// Fetch a week, attach the stakes from a wager sheet, and settle it
pub async fn settle_week(
    espn_client: &EspnApiClient,
    odds_client: &OddsApiClient,
    store: &impl SheetStore,
    sheet: &str,
    week: Option<u32>,
) -> Result<NflWeek> {
    let mut nfl_week = fetch_week(espn_client, odds_client, week).await?;
    let rows = store.read_sheet(sheet)?;
    nfl_week.apply_wagers(&rows);
    nfl_week.settle();
    Ok(nfl_week)
}
