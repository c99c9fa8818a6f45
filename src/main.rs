// Entry point: parses the CLI, loads config and tracks, then runs the TUI or
// a one-off metadata guess.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use myplayer::api::{GuessSlot, MetadataClient, TrackForm};
use myplayer::app::App;
use myplayer::config::Config;
use myplayer::library::{self, Track};
use myplayer::logging;
use myplayer::visualizer::SettingsPatch;

#[derive(Parser)]
#[command(
    name = "myplayer",
    about = "Terminal audio player with an audio-reactive visualizer",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Audio files to add to the track list
    files: Vec<PathBuf>,

    /// JSON track list (overrides `player.tracks` from the config)
    #[arg(long, value_name = "PATH")]
    tracks: Option<PathBuf>,

    /// Visualizer defaults as a JSON object, merged over the configured ones
    #[arg(long, value_name = "JSON")]
    visualizer_defaults: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the metadata endpoint to fill in title, artist, album and genre
    Guess {
        file: PathBuf,

        /// Metadata endpoint (defaults to `metadata.endpoint` from the config)
        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn check_dependencies() {
    if which::which("mpv").is_err() {
        eprintln!("Error: mpv is required but not found. Install it with your package manager.");
        std::process::exit(1);
    }
}

fn collect_tracks(list: Option<&Path>, files: &[PathBuf]) -> anyhow::Result<Vec<Track>> {
    let mut tracks = match list {
        Some(path) => library::load_tracks(path)?,
        None => Vec::new(),
    };
    tracks.extend(library::from_paths(files));
    Ok(tracks)
}

async fn guess(file: PathBuf, endpoint: &str) -> anyhow::Result<()> {
    let client = MetadataClient::new(endpoint);
    let mut slot = GuessSlot::new();
    let mut form = TrackForm::default();

    form.begin_guess();
    let ticket = slot.start(async move { client.guess_file(&file).await });
    let generation = ticket.generation;
    let outcome = ticket.wait().await;
    slot.settle(generation);
    form.apply_outcome(outcome);

    println!("{}", serde_json::to_string_pretty(&form)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_default();
    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {e}");
    }

    if let Some(Command::Guess { file, endpoint }) = cli.command {
        let endpoint = endpoint.unwrap_or_else(|| config.metadata.endpoint.clone());
        return guess(file, &endpoint).await;
    }

    check_dependencies();

    let list = cli.tracks.as_deref().or(config.player.tracks.as_deref());
    let tracks = collect_tracks(list, &cli.files)?;
    let defaults = cli
        .visualizer_defaults
        .as_deref()
        .map(SettingsPatch::from_json_str)
        .unwrap_or_default();

    let mut app = App::new(config, tracks, defaults)?;
    app.run().await?;

    Ok(())
}
