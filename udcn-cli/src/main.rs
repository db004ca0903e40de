use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

/// µDCN command-line demo client
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Express a single Interest against a built-in echo producer
    Interest {
        /// Name to request (NDN URI format)
        name: String,

        /// Timeout in milliseconds
        #[clap(short, long, default_value = "4000")]
        timeout: u64,
    },

    /// Register a prefix and serve the first Interest that arrives under it
    Publish {
        /// Prefix to register (NDN URI format)
        prefix: String,

        /// Content to respond with
        content: String,

        /// How long to wait for an Interest before giving up, in milliseconds
        #[clap(short, long, default_value = "4000")]
        timeout: u64,
    },

    /// Run a self-contained producer/consumer round trip in one process
    Demo {
        /// Prefix the producer registers
        #[clap(long, default_value = "/udcn")]
        prefix: String,

        /// Name the consumer requests
        #[clap(long, default_value = "/udcn/demo")]
        name: String,

        /// Content the producer responds with
        #[clap(long, default_value = "hello from udcn")]
        content: String,

        /// Round-trip timeout in milliseconds
        #[clap(short, long, default_value = "4000")]
        timeout: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    match cli.command {
        Commands::Interest { name, timeout } => commands::interest::run(name, timeout)?,
        Commands::Publish { prefix, content, timeout } => commands::publish::run(prefix, content, timeout)?,
        Commands::Demo { prefix, name, content, timeout } => {
            commands::demo::run(prefix, name, content, timeout)?
        }
    }

    Ok(())
}
