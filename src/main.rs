//! todo-agent CLI entry point.

use clap::Parser;

use todo_agent::cli::commands::{self, load_config};
use todo_agent::cli::{handle_error, Cli, Commands};
use todo_agent::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Keeps the file writer alive for the whole run
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Ask(args) => commands::ask::execute(args, config, cli.json).await,
        Commands::Chat(args) => commands::chat::execute(args, config, cli.json).await,
        Commands::Capabilities => commands::capabilities::execute(&config, cli.json),
        Commands::Contract => commands::contract::execute(cli.json),
        Commands::SessionConfig(args) => {
            commands::session_config::execute(&args, &config, cli.json)
        }
        Commands::Config => commands::config::execute(&config, cli.json),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
