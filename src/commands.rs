//! Command-line interface definition, parsed with `clap`.

use clap::{Parser, Subcommand};

/// The parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Translate a natural-language request into a shell command.
    ///
    /// Example: ai ask show the ten largest files here
    #[clap(name = "ask", alias = "a")]
    Ask {
        /// The request to translate.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Initialize settings: pick a storage location and configure a
    /// provider.
    Init,

    /// Manage configuration.
    ///
    /// Actions: show | add | switch <provider> | sync <status|enable|disable>
    Config {
        /// The config action to run.
        action: Option<String>,

        /// Provider name for `switch`, or the sync action.
        key: Option<String>,
    },
}
