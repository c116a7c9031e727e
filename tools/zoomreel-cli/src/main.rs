//! Zoomreel CLI: create, inspect, and export timeline-composited recordings.
//!
//! Usage:
//!   zoomreel init <NAME>                Create a new project bundle
//!   zoomreel info <PATH>                Show project information
//!   zoomreel validate <PATH>            Validate a project bundle
//!   zoomreel analyze <PATH>             Show click groups and zoom sessions
//!   zoomreel probe <PATH> --at <SECS>   Print the zoom state at a timestamp
//!   zoomreel export <PATH> --frames <DIR>

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zoomreel_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "zoomreel",
    about = "Click-zoom, cursor-follow, and overlay compositing for screen recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Parent directory (defaults to the configured projects directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Capture width
        #[arg(long)]
        width: Option<u32>,

        /// Capture height
        #[arg(long)]
        height: Option<u32>,

        /// Recording frame rate
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Validate a project bundle
    Validate {
        /// Path to the project directory
        path: PathBuf,

        /// Report stream drift above this many milliseconds
        #[arg(long, default_value = "100")]
        drift_threshold_ms: f64,
    },

    /// Show click groups and zoom session windows
    Analyze {
        /// Path to the project directory
        path: PathBuf,

        /// Override the click grouping gap (seconds)
        #[arg(long)]
        group_gap: Option<f64>,
    },

    /// Print the zoom state at a render timestamp as JSON
    Probe {
        /// Path to the project directory
        path: PathBuf,

        /// Render timestamp (seconds)
        #[arg(long)]
        at: f64,
    },

    /// Composite a frame sequence into output frames
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Directory of screen frames
        #[arg(long)]
        frames: PathBuf,

        /// Directory of camera frames for picture-in-picture
        #[arg(long)]
        camera: Option<PathBuf>,

        /// Output directory (defaults to <project>/exports/frames)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Screen frame rate (defaults to the recording fps)
        #[arg(long)]
        fps: Option<f64>,

        /// Camera frame rate (defaults to the screen frame rate)
        #[arg(long)]
        camera_fps: Option<f64>,

        /// Render threads (0 = one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Stop at the first unreadable frame
        #[arg(long)]
        fail_fast: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    zoomreel_common::logging::init_logging(&logging);
    tracing::debug!(projects_dir = %config.projects_dir.display(), "Loaded configuration");

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
        } => commands::init::run(&config, name, output, width, height, fps),
        Commands::Info { path } => commands::info::run(path),
        Commands::Validate {
            path,
            drift_threshold_ms,
        } => commands::validate::run(path, drift_threshold_ms),
        Commands::Analyze { path, group_gap } => commands::analyze::run(path, group_gap),
        Commands::Probe { path, at } => commands::analyze::probe(path, at),
        Commands::Export {
            path,
            frames,
            camera,
            output,
            fps,
            camera_fps,
            threads,
            fail_fast,
        } => {
            commands::export::run(
                &config,
                commands::export::ExportArgs {
                    path,
                    frames,
                    camera,
                    output,
                    fps,
                    camera_fps,
                    threads,
                    fail_fast,
                },
            )
            .await
        }
    }
}
