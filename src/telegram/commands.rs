//! Command handlers

use teloxide::prelude::*;

use crate::telegram::keyboards::main_keyboard;
use crate::telegram::outbound::send_markdown_v2;
use crate::telegram::types::HandlerDeps;

/// Greeting shown by /start, with the current address when one exists.
/// MarkdownV2, pre-escaped.
pub fn start_text(last_address: Option<&str>) -> String {
    let base = "Welcome to the disposable mail bot ✉️\n\
                Mint a throwaway address for signups without exposing your real inbox\\.";
    match last_address {
        Some(last) => format!("{base}\n\nYour current address:\n`{last}`"),
        None => base.to_string(),
    }
}

/// Handle /start: greet and show the main menu.
pub async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let user_id = msg.chat.id.0;
    let last = deps.registry.last_address(user_id).await;
    send_markdown_v2(bot, msg.chat.id, start_text(last.as_deref()), Some(main_keyboard())).await?;
    Ok(())
}
