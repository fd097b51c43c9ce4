//! Binary entrypoint for the mushgrid CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and seed the world database
//! - `status [--json]` - print room, item and player counts
//! - `play --name <player>` - play in the world from this terminal
//!
//! See the library crate docs for module-level details: `mushgrid::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mushgrid::config::Config;
use mushgrid::mush::{MushProcessor, MushStore};
use mushgrid::session::SessionHub;

#[derive(Parser)]
#[command(name = "mushgrid")]
#[command(about = "A player-built MUSH laid out on a map grid")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and seed the world
    Init,
    /// Show world statistics
    Status {
        /// Print the statistics as one JSON object
        #[arg(long)]
        json: bool,
    },
    /// Play from this terminal
    Play {
        /// Player name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            // Init doesn't have config yet
            init_logging(&None, cli.verbose);
            info!("Initializing new mushgrid configuration");
            if tokio::fs::metadata(&cli.config).await.is_ok() {
                warn!("{} already exists; leaving it untouched", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                info!("Configuration file created at {}", cli.config);
            }
            let config = Config::load(&cli.config).await?;
            let store = open_store(&config).await?;
            info!(
                "World ready at {} ({} rooms)",
                config.storage.world_db_path().display(),
                store.count_rooms()
            );
        }
        Commands::Status { json } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = open_store(&config).await?;
            if json {
                let payload = serde_json::json!({
                    "game": config.game.name,
                    "database": config.storage.world_db_path().display().to_string(),
                    "rooms": store.count_rooms(),
                    "items": store.count_items(),
                    "players": store.list_player_ids()?.len(),
                    "recent_log": store.recent_logs(5)?,
                });
                println!("{}", payload);
                return Ok(());
            }
            println!("{} status", config.game.name);
            println!("  database: {}", config.storage.world_db_path().display());
            println!("  rooms:    {}", store.count_rooms());
            println!("  items:    {}", store.count_items());
            println!("  players:  {}", store.list_player_ids()?.len());
            for line in store.recent_logs(5)? {
                println!("  log: {}", line);
            }
        }
        Commands::Play { name } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting {} v{}", config.game.name, env!("CARGO_PKG_VERSION"));
            let store = open_store(&config).await?;
            let processor = MushProcessor::new(store, config.world.clone());
            let mut hub = SessionHub::new(processor, config.game.welcome_message.clone());
            play(&mut hub, &name).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<MushStore> {
    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .map_err(|e| anyhow!("Failed to create data dir {}: {}", config.storage.data_dir, e))?;
    let path = config.storage.world_db_path();
    MushStore::open(&path).map_err(|e| anyhow!("Failed to open world at {}: {}", path.display(), e))
}

/// Line-oriented console: one session, stdin in, stdout out.
async fn play(hub: &mut SessionHub, name: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let (username, greeting) = match hub.connect(name) {
        Ok(joined) => joined,
        Err(e) => {
            stdout.write_all(format!("{}\n", e).as_bytes()).await?;
            return Ok(());
        }
    };
    stdout.write_all(format!("{}\n", greeting).as_bytes()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let prompt = hub
            .session(&username)
            .map(|session| session.build_prompt())
            .unwrap_or("> ");
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            hub.disconnect(&username);
            break;
        };
        let reply = hub.handle_input(&username, &line);
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        for message in hub.drain_outbox(&username) {
            stdout.write_all(format!("{}\n", message).as_bytes()).await?;
        }
        if hub.session(&username).is_none() {
            break;
        }
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|cfg| cfg.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
