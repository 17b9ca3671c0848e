use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nfl_bet_tracker::config::{Config, OddsApiToken};
use nfl_bet_tracker::espn_api::EspnApiClient;
use nfl_bet_tracker::odds_api::OddsApiClient;
use nfl_bet_tracker::sheet::{CsvSheetStore, SheetStore};
use nfl_bet_tracker::{fetch_week, settle_week};
use tracing::Level;

#[derive(Parser)]
#[command(name = "nfl-odds", about = "Get NFL odds, make bets, and calculate bet results")]
struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: Level,

    /// Week of the NFL season. Default is the current week.
    #[arg(short, long)]
    week: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Get game info and odds for the week and write them to a sheet
    Games { sheet: String },
    /// Load bets from a sheet and print the week
    Bets { sheet: String },
    /// Load bets from a sheet, settle them, and write a results sheet
    Settle { sheet: String },
    /// Show remaining Odds API requests
    Usage,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    let config = Config::from_env();
    let token =
        OddsApiToken::acquire(&config.odds_api).context("Failed to get Odds API credentials")?;

    let espn_client = EspnApiClient::new(config.espn.clone());
    let odds_client = OddsApiClient::new(config.odds_api.clone(), token);
    let store = CsvSheetStore::new(&config.sheets.dir);

    match cli.command {
        Command::Games { sheet } => {
            let nfl_week = fetch_week(&espn_client, &odds_client, cli.week)
                .await
                .context("Failed to fetch week data")?;
            if nfl_week.games.is_empty() {
                bail!("No games found for week {}", nfl_week.week);
            }
            store
                .write_sheet(&sheet, &nfl_week.to_rows())
                .context("Failed to write games sheet")?;
            println!("{}\n", nfl_week);
            println!(
                "Saved {} games to {}",
                nfl_week.games.len(),
                store.path(&sheet).display()
            );
        }
        Command::Bets { sheet } => {
            let mut nfl_week = fetch_week(&espn_client, &odds_client, cli.week)
                .await
                .context("Failed to fetch week data")?;
            let rows = store
                .read_sheet(&sheet)
                .with_context(|| format!("Failed to read bets sheet {}", sheet))?;
            nfl_week.apply_wagers(&rows);
            println!("{}", nfl_week);
        }
        Command::Settle { sheet } => {
            let nfl_week = settle_week(&espn_client, &odds_client, &store, &sheet, cli.week)
                .await
                .context("Failed to settle bets")?;
            let results_sheet = format!("{}-results", sheet);
            store
                .write_sheet(&results_sheet, &nfl_week.to_rows())
                .context("Failed to write results sheet")?;
            println!("{}\n", nfl_week);
            println!("Saved results to {}", store.path(&results_sheet).display());
        }
        Command::Usage => {
            let usage = odds_client
                .check_usage()
                .await
                .context("Failed to check Odds API usage")?;
            println!("API usage: {}", usage);
        }
    }

    Ok(())
}
