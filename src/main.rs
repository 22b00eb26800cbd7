use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod bot;
mod config;
mod error;
mod forum;
mod model;
mod notify;
mod render;
mod schedule;
mod status;
mod store;

use bot::Bot;
use config::Config;
use forum::sheet::SheetSource;
use forum::ForumTracker;
use notify::{Notifier, TelegramClient};
use status::source::{CommandStatusSource, StatusSource};
use store::{FsBlobStore, SnapshotStore};

#[derive(Parser, Debug)]
#[command(name = "cstbot", version, about = "Citizenship status notifier bot")]
struct Cli {
    /// Directory for the entry snapshot and the default config location
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Config file (defaults to <state dir>/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: scheduled updates plus Telegram commands
    Run,
    /// Community tracker operations
    Forum {
        #[command(subcommand)]
        command: ForumCommands,
    },
    /// Fetch the live status and print the summary
    Status(StatusArgs),
}

#[derive(Subcommand, Debug)]
enum ForumCommands {
    /// Fetch, diff against the snapshot, and print any updates
    Diff(DiffArgs),
    /// Print the most recently moved entries
    Latest(LatestArgs),
    /// Print one entry's current status
    Show(ShowArgs),
}

#[derive(Parser, Debug)]
struct DiffArgs {
    /// Send the update message instead of printing it
    #[arg(long)]
    notify: bool,
}

#[derive(Parser, Debug)]
struct LatestArgs {
    /// How many entries to show
    #[arg(long, default_value_t = render::LATEST_DEFAULT)]
    limit: usize,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Case identifier as it appears in the tracker
    name: String,
}

#[derive(Parser, Debug)]
struct StatusArgs {
    /// Send the summary instead of printing it
    #[arg(long)]
    notify: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(config::default_state_dir);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| state_dir.join("config.json"));
    let config = config::load(&config_path)?;

    match cli.command {
        Commands::Run => cmd_run(&config, &state_dir),
        Commands::Forum { command } => match command {
            ForumCommands::Diff(args) => cmd_forum_diff(&config, &state_dir, args),
            ForumCommands::Latest(args) => cmd_forum_latest(&config, &state_dir, args),
            ForumCommands::Show(args) => cmd_forum_show(&config, &state_dir, args),
        },
        Commands::Status(args) => cmd_status(&config, args),
    }
}

fn cmd_run(config: &Config, state_dir: &Path) -> Result<()> {
    let (token, chat_id) = config.telegram()?;
    let client = TelegramClient::new(token, chat_id);
    let tracker = build_tracker(config, state_dir)?;
    let status_source =
        build_status_source(config)?.map(|source| Box::new(source) as Box<dyn StatusSource>);

    let mut bot = Bot::new(
        client,
        tracker,
        status_source,
        config.forum_hours.clone(),
        config.status_hours.clone(),
    );
    bot.run()
}

fn cmd_forum_diff(config: &Config, state_dir: &Path, args: DiffArgs) -> Result<()> {
    let mut tracker = build_tracker(config, state_dir)?;
    tracker.prime()?;
    let records = tracker.diff_cycle()?;

    if records.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    let message = render::diff_message(&records);
    if args.notify {
        let (token, chat_id) = config.telegram()?;
        TelegramClient::new(token, chat_id).send(&message)?;
    } else {
        println!("{message}");
    }
    Ok(())
}

fn cmd_forum_latest(config: &Config, state_dir: &Path, args: LatestArgs) -> Result<()> {
    let mut tracker = build_tracker(config, state_dir)?;
    tracker.prime()?;
    let entries = tracker.entries().unwrap_or(&[]);
    print!("{}", render::latest_message(entries, args.limit));
    Ok(())
}

fn cmd_forum_show(config: &Config, state_dir: &Path, args: ShowArgs) -> Result<()> {
    let mut tracker = build_tracker(config, state_dir)?;
    tracker.prime()?;
    let entries = tracker.entries().unwrap_or(&[]);
    match render::find_entry(entries, &args.name) {
        Some(entry) => {
            println!("{}", render::entry_message(entry));
            Ok(())
        }
        None => Err(anyhow!("{} is not tracked", args.name)),
    }
}

fn cmd_status(config: &Config, args: StatusArgs) -> Result<()> {
    let Some(source) = build_status_source(config)? else {
        return Err(anyhow!(
            "no scrape command configured (CSTBOT_SCRAPE_COMMAND)"
        ));
    };
    let (live, stage) = status::update(&source)?;
    let message = render::status_message(&live, &stage, Utc::now());

    if args.notify {
        let (token, chat_id) = config.telegram()?;
        TelegramClient::new(token, chat_id).send(&message)?;
    } else {
        println!("{message}");
    }
    Ok(())
}

fn build_tracker(config: &Config, state_dir: &Path) -> Result<ForumTracker<FsBlobStore>> {
    let source = SheetSource::new(
        config.sheets_key()?,
        config.sheet_id.clone(),
        config.locations.clone(),
    );
    let snapshots = SnapshotStore::new(FsBlobStore::new(state_dir.to_path_buf()));
    Ok(ForumTracker::new(Box::new(source), snapshots))
}

fn build_status_source(config: &Config) -> Result<Option<CommandStatusSource>> {
    match config.scraper()? {
        Some((command, credentials)) => Ok(Some(CommandStatusSource::new(&command, credentials)?)),
        None => Ok(None),
    }
}
