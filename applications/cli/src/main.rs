/// Encore - manage the local music library from the command line
use clap::{Parser, Subcommand};
use encore_cli::{commands, output, App, AppConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore music library manager", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./encore.toml if present)
    #[arg(short, long, global = true, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import audio files into the library
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Scan directories and import every audio file found
    Scan {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// List library tracks
    List {
        /// Only liked tracks
        #[arg(long)]
        liked: bool,
        /// Case-insensitive title/artist filter
        #[arg(short, long)]
        query: Option<String>,
        /// Maximum number of tracks to print
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Like or unlike a track
    Like { id: String },
    /// Remove a track and its file
    Remove { id: String },
    /// Show the last played track and resume position
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = App::open(config).await?;

    match cli.command {
        Commands::Import { files } => {
            let summary = commands::import(&app, &files).await?;
            println!("{}", output::format_import(&summary));
        }
        Commands::Scan { dirs } => {
            let summary = commands::scan(&app, &dirs).await?;
            println!("{}", output::format_import(&summary));
        }
        Commands::List {
            liked,
            query,
            limit,
        } => {
            let tracks = commands::list(&app, liked, query.as_deref(), limit).await?;
            if tracks.is_empty() {
                println!("No tracks");
            }
            for track in &tracks {
                println!("{}", output::format_track(track));
            }
        }
        Commands::Like { id } => {
            let liked = commands::toggle_like(&app, &id).await?;
            println!("{} {}", if liked { "Liked" } else { "Unliked" }, id);
        }
        Commands::Remove { id } => {
            let track = commands::remove(&app, &id).await?;
            println!("Removed {} - {}", track.artist, track.title);
        }
        Commands::Status => {
            let status = commands::status(&app).await?;
            println!("{}", output::format_status(status.as_ref()));
        }
    }

    Ok(())
}
