mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pkgdock::Stage;

#[derive(Parser)]
#[command(name = "pkgdock", about = "Build docker images and RPM/DEB packages inside them")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', global = true, default_value = "pkgdock.toml")]
    config: PathBuf,

    /// Configuration section to build
    #[arg(long, short = 's', global = true, default_value = "default")]
    section: String,

    /// Verbose logging and a dump of the resolved configuration
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the Dockerfile, build the image, and tag it with BUILD_NUMBER
    Image,
    /// Build the package inside a container
    Package {
        /// Remove generated files and build-env/ first
        #[arg(long, short = 'r')]
        remove: bool,
    },
    /// Open an interactive shell in a build container
    Shell,
    /// Render the Dockerfile and entrypoint.sh
    Generate,
    /// Remove generated files and build-env/
    Clear,
    /// Print the resolved configuration
    Show {
        /// Print JSON instead of aligned text
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn stage(&self) -> Stage {
        match *self {
            Self::Image => Stage::Image,
            Self::Package { remove } => Stage::Package { remove },
            Self::Shell => Stage::Shell,
            Self::Generate => Stage::Generate,
            Self::Clear => Stage::Clear,
            Self::Show { json } => Stage::Show { json },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = commands::Settings {
        config: cli.config,
        section: cli.section,
        debug: cli.debug,
    };

    match commands::run_stage(&settings, cli.command.stage()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(commands::exit_status(&e))
        }
    }
}
