use clap::{Parser, Subcommand};
use config_mapping_cli::commands::{keys_cmd, resolve_cmd};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// config-map CLI: Resolve typed configuration mappings from properties
#[derive(Parser)]
#[command(name = "config-map")]
#[command(about = "Resolve typed configuration mappings from properties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a declared mapping and print the resolved values
    Resolve(resolve_cmd::ResolveArgs),

    /// List the property keys a declared mapping reads
    Keys(keys_cmd::KeysArgs),

    /// Show the CLI version
    Version,
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("CONFIG_MAP_LOG"))
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Resolve(args) => resolve_cmd::execute(args),
        Commands::Keys(args) => keys_cmd::execute(args),
        Commands::Version => Ok(format!("config-map version {}", env!("CARGO_PKG_VERSION"))),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
