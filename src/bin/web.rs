use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use nfl_bet_tracker::config::{Config, OddsApiToken};
use nfl_bet_tracker::espn_api::EspnApiClient;
use nfl_bet_tracker::odds_api::OddsApiClient;
use nfl_bet_tracker::sheet::CsvSheetStore;
use nfl_bet_tracker::week::NflWeek;
use nfl_bet_tracker::{settle_week, GameRecord, MarketKind, Side};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tracing::{error, info};

/// One table row of the results page
struct GameRow {
    kickoff: String,
    matchup: String,
    location: String,
    score: String,
    h2h: String,
    spread: String,
    total: String,
    result: String,
    net_class: &'static str,
}

impl GameRow {
    fn from_game(game: &GameRecord) -> Self {
        let market = |kind: MarketKind| {
            let text = game.odds.as_ref().and_then(|odds| match kind {
                MarketKind::H2h => odds.h2h.as_ref().map(|m| m.to_string()),
                MarketKind::Spread => odds.spread.as_ref().map(|m| m.to_string()),
                MarketKind::Total => odds.total.as_ref().map(|m| m.to_string()),
            });
            text.unwrap_or_else(|| "-".to_string())
        };
        let score = match (game.score_for(Side::Away), game.score_for(Side::Home)) {
            (Some(away), Some(home)) => format!("{} - {}", away, home),
            _ => "-".to_string(),
        };
        let net = game.settlement.map_or(0.0, |r| r.net);

        Self {
            kickoff: game.kickoff.format("%a %Y-%m-%d %I:%M %p").to_string(),
            matchup: format!("{} at {}", game.teams.away, game.teams.home),
            location: game.location.clone(),
            score,
            h2h: market(MarketKind::H2h),
            spread: market(MarketKind::Spread),
            total: market(MarketKind::Total),
            result: game
                .settlement
                .map_or_else(|| "-".to_string(), |r| r.to_string()),
            net_class: net_class(net),
        }
    }
}

fn net_class(net: f64) -> &'static str {
    if net > 0.0 {
        "win"
    } else if net < 0.0 {
        "loss"
    } else {
        "even"
    }
}

#[derive(Template)]
#[template(path = "week.html")]
struct WeekTemplate {
    week: u32,
    games: Vec<GameRow>,
    total: String,
    total_class: &'static str,
}

impl WeekTemplate {
    fn from_week(week: &NflWeek) -> Self {
        let mut games: Vec<&GameRecord> = week.games.iter().collect();
        games.sort_by_key(|game| game.kickoff);
        let net = week.settlement.map_or(0.0, |r| r.net);

        Self {
            week: week.week,
            games: games.into_iter().map(GameRow::from_game).collect(),
            total: week
                .settlement
                .map_or_else(|| "-".to_string(), |r| r.to_string()),
            total_class: net_class(net),
        }
    }
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

#[derive(Clone)]
struct AppState {
    week: Arc<RwLock<Option<NflWeek>>>,
    espn_client: Arc<EspnApiClient>,
}

async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let week = state.week.read().await;

    match week.as_ref() {
        Some(week) => HtmlTemplate(WeekTemplate::from_week(week)).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "Data not loaded yet").into_response(),
    }
}

/// Pull the latest scores and settle again
///
/// The write lock is only taken once the schedule has arrived.
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let Some(week_number) = state.week.read().await.as_ref().map(|week| week.week) else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Data not loaded yet").into_response();
    };

    match state.espn_client.fetch_week(Some(week_number)).await {
        Ok(schedule) => {
            if let Some(week) = state.week.write().await.as_mut() {
                week.update_scores(&schedule);
                week.settle();
            }
            Redirect::to("/").into_response()
        }
        Err(e) => {
            error!("Failed to refresh scores: {}", e);
            (StatusCode::BAD_GATEWAY, format!("Failed to refresh scores: {}", e)).into_response()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let token = OddsApiToken::acquire(&config.odds_api)?;
    let espn_client = Arc::new(EspnApiClient::new(config.espn.clone()));
    let odds_client = OddsApiClient::new(config.odds_api.clone(), token);
    let store = CsvSheetStore::new(&config.sheets.dir);

    let sheet = std::env::var("BETS_SHEET").unwrap_or_else(|_| "bets".to_string());
    let week_number = std::env::var("WEEK").ok().and_then(|w| w.parse().ok());

    info!("Loading bets from sheet {}", sheet);
    let week = match settle_week(&espn_client, &odds_client, &store, &sheet, week_number).await {
        Ok(week) => {
            info!(
                "Week {} loaded: {} games",
                week.week,
                week.games.len()
            );
            Some(week)
        }
        Err(e) => {
            error!("Error loading week: {}", e);
            error!("Server will start but pages may show errors");
            None
        }
    };

    let state = AppState {
        week: Arc::new(RwLock::new(week)),
        espn_client,
    };

    let app = Router::new()
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(home))
        .route("/refresh", get(refresh))
        .with_state(state);

    info!("Starting web server at http://127.0.0.1:3000");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    axum::serve(listener, app).await?;

    Ok(())
}
