//! srcgen CLI tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "srcgen")]
#[command(about = "Source generation configuration CLI", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "SRCGEN_CONFIG", default_value = "srcgen.kdl")]
    config: String,

    /// Root directory, defaults to the directory of the configuration file
    #[arg(long)]
    root_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration
    Validate,
    /// Print resolved variables
    Vars {
        /// Show the variables of a project instead of the root
        #[arg(long)]
        project: Option<String>,
    },
    /// Print the initialized configuration as JSON
    Show,
    /// Print the directory an artifact of a generator is written to
    Target {
        /// Generator name
        generator: String,
        /// Artifact name
        artifact: String,
        /// Path of the generated file, used to select a target override
        #[arg(long)]
        path: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let root_dir = cli.root_dir.as_deref();
    match cli.command {
        Commands::Validate => {
            commands::validate(&cli.config, root_dir)?;
        }
        Commands::Vars { project } => {
            commands::vars::print(&cli.config, root_dir, project.as_deref())?;
        }
        Commands::Show => {
            commands::show(&cli.config, root_dir)?;
        }
        Commands::Target {
            generator,
            artifact,
            path,
        } => {
            commands::target::print(&cli.config, root_dir, &generator, &artifact, path.as_deref())?;
        }
    }

    Ok(())
}
