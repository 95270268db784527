//! Command-line interface parsing and handling
//!
//! `weai` with no subcommand starts the chat UI; `set` and `unset` edit the
//! persisted configuration without touching the terminal.

use std::error::Error;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::core::config::data::Config;
use crate::ui::chat_loop::{run_chat, ChatOptions};
use crate::utils::diagnostics::init_tracing;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "weai")]
#[command(version = VERSION)]
#[command(about = "A terminal chat client for the WE AI agriculture assistant")]
#[command(
    long_about = "weai is a full-screen terminal client for the WE AI conversation service. \
Replies stream in over a WebSocket and are typed out character by character over an \
animated orbit backdrop.\n\n\
Controls:\n\
  Ctrl+O            Show or hide the chat panel\n\
  Enter             Send the message\n\
  Up/Down/PgUp/PgDn Scroll the transcript\n\
  Ctrl+L            Clear the conversation and start a new one\n\
  Esc               Hide the chat panel\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub chat: ChatArgs,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ChatArgs {
    /// Base URL of the conversation service (overrides the config file)
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server_url: Option<String>,

    /// Open the chat panel on startup
    #[arg(short = 'o', long, global = true)]
    pub open: bool,

    /// Append the transcript to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,

    /// Write diagnostic tracing output to the specified file
    #[arg(long, global = true, value_name = "FILE")]
    pub debug_log: Option<String>,

    /// Skip the animated backdrop
    #[arg(long, global = true)]
    pub no_background: bool,
}

impl From<ChatArgs> for ChatOptions {
    fn from(args: ChatArgs) -> Self {
        ChatOptions {
            server_url: args.server_url,
            log: args.log,
            open: args.open,
            no_background: args.no_background,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Set a configuration value, or print the configuration if no value is given
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.chat.debug_log.as_deref())?;

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(args.chat.into()).await,
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            match join_value(value) {
                Some(value) => {
                    if let Err(e) = config.set_key(&key, &value) {
                        eprintln!("❌ {e}");
                        std::process::exit(1);
                    }
                    config.save()?;
                    println!("✅ Set {key} to: {value}");
                }
                None => config.print_all(),
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            if let Err(e) = config.unset_key(&key) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

/// Multi-word values (e.g. a greeting) arrive as separate arguments.
fn join_value(value: Option<Vec<String>>) -> Option<String> {
    value.filter(|parts| !parts.is_empty()).map(|parts| parts.join(" "))
}

#[cfg(test)]
mod tests;
