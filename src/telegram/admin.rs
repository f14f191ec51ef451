//! Admin functionality: the block/unblock command pair.
//!
//! `/block` and `/unblock` are hidden text-prefix commands (not in the
//! public Command enum). Each accepts an inline numeric argument, or bare
//! enters a two-state flow where the next message from the admin carries
//! the target id.

use lazy_regex::regex;
use teloxide::prelude::*;

use crate::core::config::admin::ADMIN_USER_ID;
use crate::telegram::state::UserState;
use crate::telegram::types::HandlerDeps;

/// Check if user is the configured administrator
pub fn is_admin(user_id: i64) -> bool {
    *ADMIN_USER_ID != 0 && *ADMIN_USER_ID == user_id
}

/// First run of 5+ digits anywhere in the message, parsed as a user id.
pub fn parse_target_id(text: &str) -> Option<i64> {
    regex!(r"\d{5,}").find(text).and_then(|m| m.as_str().parse().ok())
}

/// Handle `/block [id]` from the admin. Non-admins are ignored.
pub async fn handle_block_command(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    message_text: &str,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    if !is_admin(user_id) {
        log::debug!("Ignoring /block from non-admin {}", user_id);
        return Ok(());
    }

    match parse_target_id(message_text) {
        Some(target) => {
            apply_block(bot, chat_id, target, deps).await?;
        }
        None => {
            deps.interaction.set(user_id, UserState::AwaitingBlockTarget);
            bot.send_message(chat_id, "Send the numeric id of the user to block:").await?;
        }
    }
    Ok(())
}

/// Handle `/unblock [id]` from the admin. Non-admins are ignored.
pub async fn handle_unblock_command(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    message_text: &str,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    if !is_admin(user_id) {
        log::debug!("Ignoring /unblock from non-admin {}", user_id);
        return Ok(());
    }

    match parse_target_id(message_text) {
        Some(target) => {
            apply_unblock(bot, chat_id, target, deps).await?;
        }
        None => {
            deps.interaction.set(user_id, UserState::AwaitingUnblockTarget);
            bot.send_message(chat_id, "Send the numeric id of the user to unblock:").await?;
        }
    }
    Ok(())
}

/// Block `target` and confirm to the admin.
pub async fn apply_block(bot: &Bot, chat_id: ChatId, target: i64, deps: &HandlerDeps) -> ResponseResult<()> {
    match deps.registry.block(target).await {
        Ok(()) => {
            log::info!("Admin blocked user {}", target);
            bot.send_message(chat_id, format!("🚫 Blocked user {}", target)).await?;
        }
        Err(e) => {
            log::error!("Failed to block user {}: {}", target, e);
            bot.send_message(chat_id, "⚠️ Could not save the block, try again later.").await?;
        }
    }
    Ok(())
}

/// Unblock `target`, reporting a no-op distinctly from a real unblock.
pub async fn apply_unblock(bot: &Bot, chat_id: ChatId, target: i64, deps: &HandlerDeps) -> ResponseResult<()> {
    match deps.registry.unblock(target).await {
        Ok(true) => {
            log::info!("Admin unblocked user {}", target);
            bot.send_message(chat_id, format!("✅ Unblocked user {}", target)).await?;
        }
        Ok(false) => {
            bot.send_message(chat_id, format!("User {} was not blocked.", target)).await?;
        }
        Err(e) => {
            log::error!("Failed to unblock user {}: {}", target, e);
            bot.send_message(chat_id, "⚠️ Could not save the unblock, try again later.").await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_long_digit_run() {
        assert_eq!(parse_target_id("/block 1234567"), Some(1234567));
        assert_eq!(parse_target_id("id is 99999 or maybe 11111"), Some(99999));
    }

    #[test]
    fn short_runs_do_not_count() {
        assert_eq!(parse_target_id("/block 1234"), None);
        assert_eq!(parse_target_id("no digits at all"), None);
    }

    #[test]
    fn digits_inside_words_still_parse() {
        assert_eq!(parse_target_id("user#123456!"), Some(123456));
    }
}
