//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod commands;
pub mod keyboards;
pub mod menu;
pub mod messages;
pub mod notifications;
pub mod outbound;
pub mod schema;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use outbound::{send_markdown_v2, TelegramOutbound};
pub use schema::schema;
pub use state::{InteractionState, UserState};
pub use types::{HandlerDeps, HandlerError};
