//! Command-line interface

use clap::{Parser, Subcommand};

/// Disposable-email Telegram bot
#[derive(Parser, Debug)]
#[command(name = "mailcloak", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot
    Run {
        /// Receive Telegram updates over a webhook (requires PUBLIC_URL)
        /// instead of long polling
        #[arg(long, default_value_t = false)]
        webhook: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
