//! # Drapon Main Entry Point
//!
//! Generates a world, then drives the game headlessly: commands arrive as
//! lines on stdin (or from a script file) and a 100 ms tick advances the
//! scheduler and the typewriter between them.

use clap::Parser;
use drapon::config::TICK_MILLIS;
use drapon::{
    DraponError, DraponResult, GameConfig, GameEvent, GameState, InputHandler, PlayerInput,
    SaveRecord, TextRenderer,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Command line arguments for Drapon.
#[derive(Parser, Debug)]
#[command(name = "drapon")]
#[command(about = "A tile-based exploration RPG core driven from the terminal")]
#[command(version)]
struct Args {
    /// Random seed for world generation (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// File the save record is written to and read from
    #[arg(long, default_value = "drapon.sav")]
    save_file: PathBuf,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Ticks to run after the last command so pending continuations fire
    #[arg(long, default_value_t = 30)]
    drain_ticks: u64,

    /// Disable random encounters
    #[arg(long)]
    peaceful: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> DraponResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Drapon v{}", drapon::VERSION);

    if let Err(e) = run_game(&args).await {
        error!("Game ended with an error: {}", e);
        return Err(e);
    }
    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> DraponResult<()> {
    let filter: log::LevelFilter = log_level.parse().map_err(|_| {
        DraponError::InvalidState(format!("unknown log level '{}'", log_level))
    })?;

    #[cfg(feature = "dev-tools")]
    {
        let level = match filter {
            log::LevelFilter::Off | log::LevelFilter::Error => tracing::Level::ERROR,
            log::LevelFilter::Warn => tracing::Level::WARN,
            log::LevelFilter::Info => tracing::Level::INFO,
            log::LevelFilter::Debug => tracing::Level::DEBUG,
            log::LevelFilter::Trace => tracing::Level::TRACE,
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .filter_level(filter)
            .format_timestamp(None)
            .init();
    }

    Ok(())
}

/// Spawns a reader that forwards input lines until EOF.
fn spawn_line_reader(script: Option<PathBuf>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let result: std::io::Result<()> = async {
            match script {
                Some(path) => {
                    let file = tokio::fs::File::open(&path).await?;
                    let mut lines = BufReader::new(file).lines();
                    while let Some(line) = lines.next_line().await? {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                }
                None => {
                    let mut lines = BufReader::new(tokio::io::stdin()).lines();
                    while let Some(line) = lines.next_line().await? {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(())
        }
        .await;
        if let Err(e) = result {
            warn!("Input reader stopped: {}", e);
        }
    });
    rx
}

/// Runs the main game loop.
async fn run_game(args: &Args) -> DraponResult<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Generating world with seed: {}", seed);

    let config = if args.peaceful {
        GameConfig::for_testing()
    } else {
        GameConfig::default()
    };
    let mut state = GameState::new(seed, config);
    let input_handler = InputHandler::new();
    let renderer = TextRenderer::new();

    println!("{}", renderer.frame(&state));

    let mut lines = spawn_line_reader(args.script.clone());
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_MILLIS));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = state.tick();
                report(&events, &mut state);
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Input closed");
                    break;
                };
                let input = match input_handler.parse(&line) {
                    Ok(input) => input,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match input {
                    PlayerInput::Quit => {
                        info!("Quit requested");
                        return Ok(());
                    }
                    PlayerInput::Help => println!("{}", input_handler.help_text()),
                    PlayerInput::Wait => {}
                    PlayerInput::Save => {
                        state.save_record().save_to_file(&args.save_file)?;
                        println!("Saved to {}", args.save_file.display());
                    }
                    PlayerInput::Load => match SaveRecord::load_from_file(&args.save_file) {
                        Ok(record) => {
                            state.apply_save_record(&record);
                            println!("Loaded {}", args.save_file.display());
                        }
                        Err(e) => println!("Could not load save: {}", e),
                    },
                    other => {
                        if let Some(events) = input_handler.dispatch(other, &mut state) {
                            report(&events, &mut state);
                        }
                    }
                }
                println!("{}", renderer.frame(&state));
            }
        }
    }

    for _ in 0..args.drain_ticks {
        let events = state.tick();
        report(&events, &mut state);
    }
    println!("{}", renderer.frame(&state));
    info!(
        "Session over after {} steps and {} battles won",
        state.statistics.steps_taken, state.statistics.battles_won
    );
    Ok(())
}

/// Prints queued messages and logs notable events.
fn report(events: &[GameEvent], state: &mut GameState) {
    for event in events {
        match event {
            GameEvent::Message { .. } | GameEvent::Blocked { .. } | GameEvent::PlayerMoved { .. } => {
                debug!("{:?}", event)
            }
            _ => info!("{:?}", event),
        }
    }
    for message in state.messages.drain() {
        println!("{}", message.plain_text());
    }
}
