//! Binary entrypoint for the petden CLI.
//!
//! Commands:
//! - `start` - run the game server
//! - `init` - create a starter `config.toml`
//! - `status` - print player/offer counts from the store
//!
//! See the library crate docs for module-level details: `petden::`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use petden::config::Config;
use petden::game::{GameEngine, GameSettings, GameStore};
use petden::server::GameServer;

#[derive(Parser)]
#[command(name = "petden")]
#[command(about = "A virtual pet simulation and trading server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the game server
    Start {
        /// Override the configured bind address (e.g. 0.0.0.0:4650)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Initialize a new configuration file
    Init,
    /// Show store statistics
    Status,
}

fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Ok(parsed) = level.parse() {
        builder.filter_level(parsed);
    }
    let _ = builder.try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging("info");
            Config::create_default(&cli.config).await?;
            info!("wrote default configuration to {}", cli.config);
            println!("Created {}. Edit it, then run `petden start`.", cli.config);
        }
        Commands::Start { bind } => {
            let mut config = Config::load(&cli.config).await?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            init_logging(&config.logging.level);

            let store = GameStore::open(&config.storage.data_dir)?;
            let seeded = store.seed_templates_if_needed()?;
            if seeded > 0 {
                info!("seeded {} canonical templates", seeded);
            }
            let settings = GameSettings {
                offer_listing_limit: config.game.offer_listing_limit,
                max_name_length: config.game.max_name_length,
            };
            let engine = GameEngine::new(store, settings);
            GameServer::new(engine, &config).run().await?;
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config.logging.level);

            let store = GameStore::open(&config.storage.data_dir)?;
            let players = store.list_player_ids()?;
            // Open offers double as the escrowed-item count.
            let open_offers = store.list_open_offers()?.len();
            let transactions = store.list_transactions()?.len();
            println!("players:       {}", players.len());
            println!("offers total:  {}", store.count_offers());
            println!("offers open:   {}", open_offers);
            println!("transactions:  {}", transactions);

            let mut total_coins: i64 = 0;
            for id in &players {
                total_coins += store.get_player(id)?.coins;
            }
            println!("coins held:    {}", total_coins);
        }
    }

    Ok(())
}
