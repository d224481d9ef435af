/// Longplay Headless - drive a playback session from the terminal
use clap::{Parser, Subcommand};
use longplay_core::{HistoryStore, SettingsStore};
use longplay_headless::{
    commands::{self, Input, HELP},
    config::AppConfig,
    display,
};
use longplay_session::{MediaAction, Session, SessionHandle, SimulatedEmbed};
use longplay_storage::{MemoryStore, SqliteStore};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for a command to show up in the snapshot before printing
const SETTLE: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "longplay-headless")]
#[command(about = "Longplay playback session driven from stdin", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./longplay.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use an in-memory store instead of the configured database
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin and drive the session (default)
    Run,
    /// Print recent listening history
    History {
        /// Number of entries
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete history, resume points and settings
    Clear,
}

struct Stores {
    history: Arc<dyn HistoryStore>,
    settings: Arc<dyn SettingsStore>,
    sqlite: Option<SqliteStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "longplay_headless=info,longplay_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let stores = open_stores(&config, cli.memory).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, stores).await?,
        Commands::History { limit } => print_history(&stores, limit).await?,
        Commands::Clear => clear(&stores).await?,
    }

    Ok(())
}

async fn open_stores(config: &AppConfig, memory: bool) -> anyhow::Result<Stores> {
    if !memory {
        match SqliteStore::open(&config.storage.database_url).await {
            Ok(store) => {
                tracing::info!("Database connected: {}", config.storage.database_url);
                let shared = Arc::new(store.clone());
                return Ok(Stores {
                    history: shared.clone(),
                    settings: shared,
                    sqlite: Some(store),
                });
            }
            Err(e) if config.storage.fallback_to_memory => {
                tracing::warn!("Database unavailable ({}), using in-memory store", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let store = Arc::new(MemoryStore::new());
    Ok(Stores {
        history: store.clone(),
        settings: store,
        sqlite: None,
    })
}

async fn run(config: AppConfig, stores: Stores) -> anyhow::Result<()> {
    let embed = SimulatedEmbed::new();
    let session = Session::new(
        config.session.clone(),
        Box::new(embed.clone()),
        Arc::clone(&stores.history),
        Arc::clone(&stores.settings),
    );
    let (handle, task) = session.spawn();
    tracing::info!("Session started");

    println!("{}", display::summary(&handle.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match commands::parse_line(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::History(limit) => print_history(&stores, limit).await?,
            Input::Status => print_snapshot(&handle, config.output.json)?,
            input => {
                // the clock only shows up on the next position poll
                let settle = if matches!(input, Input::Advance(_)) {
                    config.session.poll_interval() * 2
                } else {
                    SETTLE
                };
                let mut changes = handle.subscribe();
                drop(changes.borrow_and_update());
                apply(&handle, &embed, input)?;
                let _ = tokio::time::timeout(settle, changes.changed()).await;
                print_snapshot(&handle, config.output.json)?;
            }
        }
    }

    handle.shutdown().await?;
    task.await?;
    tracing::info!("Session stopped");
    Ok(())
}

fn apply(handle: &SessionHandle, embed: &SimulatedEmbed, input: Input) -> anyhow::Result<()> {
    match input {
        Input::Load { track, start } => handle.load_track(track, start)?,
        Input::Queue(tracks) => handle.set_queue(tracks, 0)?,
        Input::Play => handle.play()?,
        Input::Pause => handle.pause()?,
        Input::Toggle => handle.toggle()?,
        Input::Seek(position) => handle.seek(position)?,
        Input::Forward(step) => handle.media_action(MediaAction::SeekForward(step))?,
        Input::Back(step) => handle.media_action(MediaAction::SeekBackward(step))?,
        Input::Next => handle.play_next()?,
        Input::Previous => handle.play_previous()?,
        Input::Select(index) => handle.select_index(index)?,
        Input::Shuffle => handle.toggle_shuffle()?,
        Input::Repeat => handle.cycle_repeat_mode()?,
        Input::AutoPlay(enabled) => handle.set_auto_play_next(enabled)?,
        Input::Rate(rate) => handle.set_rate(rate)?,
        Input::Volume(volume) => handle.set_volume(volume)?,
        Input::Expand(expanded) => handle.set_expanded(expanded)?,
        Input::Advance(seconds) => embed.advance(seconds),
        Input::Fail(code) => embed.fail_with(code),
        Input::Visibility(visibility) => handle.set_visibility(visibility)?,
        Input::Close => handle.close()?,
        Input::Status | Input::History(_) | Input::Help | Input::Quit => {}
    }
    Ok(())
}

fn print_snapshot(handle: &SessionHandle, json: bool) -> anyhow::Result<()> {
    let snapshot = handle.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!("{}", display::summary(&snapshot));
    }
    Ok(())
}

async fn print_history(stores: &Stores, limit: usize) -> anyhow::Result<()> {
    let entries = stores.history.get_recent_history(limit).await?;
    if entries.is_empty() {
        println!("No history");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {}  {} ({})",
            entry.played_at.format("%Y-%m-%d %H:%M"),
            display::clock(entry.last_position),
            entry.track.title,
            entry.track.id.as_str(),
        );
    }
    Ok(())
}

async fn clear(stores: &Stores) -> anyhow::Result<()> {
    match &stores.sqlite {
        Some(store) => {
            store.clear_all().await?;
            println!("Cleared history, resume points and settings");
        }
        None => println!("In-memory store, nothing to clear"),
    }
    Ok(())
}
