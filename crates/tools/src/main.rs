use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deploy_tools::{logging, Config};

#[derive(Parser)]
#[command(name = "deploy")]
#[command(about = "Resolve and check contract deployment configuration")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Env file to read before resolving variables
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, validate and print the configuration
    Config {
        /// Print JSON instead of a summary
        #[arg(short, long)]
        json: bool,
        /// Include raw credentials in JSON output
        #[arg(long, requires = "json")]
        reveal: bool,
    },
    /// List configured networks
    Networks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::from_process_env(cli.env_file.as_deref())
        .context("failed to load deployment configuration")?;

    match cli.command {
        Commands::Config { json, reveal } => {
            if json {
                println!("{}", config.to_json(reveal)?);
            } else {
                config.print_summary();
            }
        }
        Commands::Networks => {
            for (name, network) in config.networks() {
                println!("{name}\t{}", network.url());
            }
        }
    }

    Ok(())
}
