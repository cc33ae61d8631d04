use std::env;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use mind_chill::config::{HubConfig, LOG_ENV};
use mind_chill::games::{self, GameId};
use mind_chill::hub;
use mind_chill::scores::{FileStore, HighScoreStore};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "mind_chill=info";

fn main()
{
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String>
{
    let args: Vec<String> = env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((first, rest)) if !first.starts_with("--") => (Some(first.as_str()), rest),
        _ => (None, args.as_slice()),
    };
    match command {
        None => {
            let config = HubConfig::from_args(rest)?;
            init_logging(&config);
            hub::run(&config, None)
        }
        Some("list") => {
            list_games();
            Ok(())
        }
        Some("scores") => {
            let config = HubConfig::from_args(rest)?;
            init_logging(&config);
            print_scores(&config)
        }
        Some("play") => {
            let (name, options) = rest
                .split_first()
                .ok_or_else(|| "Expected a game name after 'play'".to_string())?;
            let game: GameId = name.parse().map_err(|err: mind_chill::HubError| err.to_string())?;
            let config = HubConfig::from_args(options)?;
            init_logging(&config);
            hub::run(&config, Some(game))
        }
        Some("-h") | Some("--help") => {
            print_help();
            Ok(())
        }
        Some(other) => Err(format!("Unknown command '{other}'. Run with --help.")),
    }
}

/// Logs go to a file under the data directory; the terminal belongs to the UI.
fn init_logging(config: &HubConfig)
{
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let file = fs::create_dir_all(&config.data_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_path())
    });
    match file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(err) => {
            eprintln!(
                "Warning: couldn't open log file {} ({err}). Logging disabled.",
                config.log_path().display()
            );
        }
    }
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<14} - {}", game.id.name(), game.description);
    }
}

fn print_scores(config: &HubConfig) -> Result<(), String>
{
    let mut store = HighScoreStore::new(FileStore::new(&config.data_dir));
    store.ensure_initialized().map_err(|err| err.to_string())?;
    println!("Best scores:");
    for game in GameId::ALL {
        println!(
            "  {:<16} {}",
            game.title(),
            game.metric().format_best(store.get(game))
        );
    }
    Ok(())
}

fn print_help()
{
    println!("mind-chill");
    println!("\nUsage:");
    println!("  mind-chill [--fps=60] [--data-dir=PATH]");
    println!("  mind-chill list");
    println!("  mind-chill scores [--data-dir=PATH]");
    println!("  mind-chill play <game> [--fps=60] [--data-dir=PATH]");
    println!("\nGames:");
    for game in GameId::ALL {
        println!("  {game}");
    }
    println!("\nNotes:");
    println!("  Arrows/WASD move, Space/Enter act, the mouse clicks, Esc leaves a game.");
    println!("  Scores are kept in MIND_CHILL_DATA_DIR (default ~/.local/share/mind-chill).");
    println!("  Set MIND_CHILL_LOG to change the log filter (default {DEFAULT_LOG_FILTER}).");
}
