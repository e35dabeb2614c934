//! incidentmap CLI - monthly severity matrix for status page incident feeds

use clap::Parser;
use env_logger::Env;

mod aggregate;
mod cache;
mod cli;
mod client;
mod config;
mod error;
mod output;

use cli::{CacheCommands, Cli, Commands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the verbosity flags
fn init_logging(cli: &Cli) {
    let default_filter = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Report(args) => cli::report::run(&opts, &args).await,
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
        },
        Commands::Version => {
            println!("incidentmap version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
