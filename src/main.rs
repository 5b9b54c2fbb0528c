//! Entrypoint for the `ai` CLI.
//!
//! Parses the command line, resolves the settings store, and dispatches to
//! the command implementations. Exit codes are decided by the command
//! layer; this file only forwards them to the process.

use clap::Parser;
use console::style;
use once_cell::sync::OnceCell;
use std::process;
use tracing::debug;

use ianai::commands::{Cli, Commands};
use ianai::prompt::TermPrompt;
use ianai::store::{SettingsStore, StoreError};
use ianai::{api, config};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new().expect("failed to start async runtime");
    let code = runtime.block_on(run());
    process::exit(code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let store = match SettingsStore::discover() {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{}", style(err).red());
            return 1;
        }
    };
    let mut prompt = TermPrompt;

    match cli.command {
        Commands::Init => match config::init(&store, &mut prompt) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{}", style(format!("Initialization failed: {err}")).red());
                1
            }
        },
        Commands::Config { action, key } => {
            config::run(action.as_deref().unwrap_or(""), key.as_deref(), &store, &mut prompt)
        }
        Commands::Ask { message } => {
            let message = message.join(" ");
            if message.trim().is_empty() {
                eprintln!(
                    "{}",
                    style("Message is required. Please provide a message to send to the AI.")
                        .red()
                );
                return 1;
            }

            let settings = match store.load() {
                Ok(settings) => settings,
                Err(StoreError::Invalid(diagnostics)) => {
                    for diagnostic in &diagnostics {
                        eprintln!("{}", style(diagnostic).red());
                    }
                    return 1;
                }
                Err(err) => {
                    eprintln!("{}", style(err).red());
                    return 1;
                }
            };

            debug!("sending message via {}", settings.provider);
            match api::send_message(&settings, &message).await {
                Ok(reply) => {
                    println!("{}", api::strip_code_fence(&reply));
                    0
                }
                Err(err) => {
                    eprintln!("{}", style(format!("Failed to send message: {err}")).red());
                    1
                }
            }
        }
    }
}
