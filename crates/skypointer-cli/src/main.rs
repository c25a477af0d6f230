mod cmd;
mod hardware;
mod interrupt;
mod output;
mod root;
#[cfg(feature = "rpi")]
mod rpi;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skypointer",
    about = "Point a model and an LED ring at a tracked object",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .skypointer/)
    #[arg(long, global = true, env = "SKYPOINTER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Use in-memory hardware instead of GPIO (the button presses once per calibration step)
    #[arg(long, global = true)]
    simulate: bool,

    /// Log at debug level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .skypointer/config.yaml with defaults
    Init,

    /// Show the saved calibration and position
    Status,

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Calibrate the ring and the model with the push button
    Calibrate {
        /// Record this ring cell as north and zero at the current orientation
        #[arg(long)]
        north: Option<usize>,
    },

    /// Show the move a bearing would produce, without moving
    #[command(allow_negative_numbers = true)]
    Plan {
        /// Bearing to the object in degrees
        bearing: f64,

        /// Object's own heading, turned to by the model
        #[arg(long)]
        track: Option<f64>,
    },

    /// Point at one bearing and exit
    #[command(allow_negative_numbers = true)]
    Track {
        /// Bearing to the object in degrees
        bearing: f64,

        /// Object's own heading, turned to by the model
        #[arg(long)]
        track: Option<f64>,
    },

    /// Start up, then track fixes read from stdin until EOF or Ctrl-C
    Run,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match &cli.command {
            Commands::Run | Commands::Calibrate { north: None } => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Calibrate { north } => cmd::calibrate::run(&root, north, cli.simulate, cli.json),
        Commands::Plan { bearing, track } => cmd::plan::run(&root, bearing, track, cli.json),
        Commands::Track { bearing, track } => {
            cmd::track::run(&root, bearing, track, cli.simulate, cli.json)
        }
        Commands::Run => cmd::run::run(&root, cli.simulate, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
