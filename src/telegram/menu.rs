//! Callback-query handling for the inline menu.
//!
//! Navigation edits the message in place; only the copy action sends a new
//! message (so the address stays on screen for tap-to-copy).

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::telegram::admin::is_admin;
use crate::telegram::commands::start_text;
use crate::telegram::keyboards::{
    back_keyboard, main_keyboard, CB_BACK, CB_CHOOSE_NAME, CB_COPY_EMAIL, CB_MY_EMAILS, CB_RANDOM_EMAIL,
};
use crate::telegram::state::UserState;
use crate::telegram::types::HandlerDeps;

/// Render the owned-address list screen. MarkdownV2, addresses in code
/// spans.
pub fn format_address_list(addresses: &[String]) -> String {
    let mut lines = vec!["📁 Your addresses:".to_string()];
    for address in addresses {
        lines.push(format!("• `{}`", address));
    }
    lines.join("\n")
}

/// Handles button presses from the main menu and its sub-screens.
pub async fn handle_menu_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> ResponseResult<()> {
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(data) = q.data else {
        return Ok(());
    };
    let user_id = i64::try_from(q.from.id.0).unwrap_or(0);

    let chat_id = q.message.as_ref().map(|m| m.chat().id);
    let message_id = q.message.as_ref().map(|m| m.id());
    let (Some(chat_id), Some(message_id)) = (chat_id, message_id) else {
        return Ok(());
    };

    if deps.registry.is_blocked(user_id).await && !is_admin(user_id) {
        log::debug!("Suppressing button press from blocked user {}", user_id);
        return Ok(());
    }

    match data.as_str() {
        CB_CHOOSE_NAME => {
            deps.interaction.set(user_id, UserState::AwaitingName);
            bot.edit_message_text(chat_id, message_id, "✏️ Send the name you want for the address:")
                .await?;
        }

        CB_RANDOM_EMAIL => match deps.registry.mint_random(user_id).await {
            Ok(address) => {
                bot.edit_message_text(chat_id, message_id, format!("New address minted ✅\n\n`{}`", address))
                    .parse_mode(ParseMode::MarkdownV2)
                    .reply_markup(back_keyboard())
                    .await?;
            }
            Err(e) => {
                log::error!("Random mint failed for user {}: {}", user_id, e);
                bot.edit_message_text(
                    chat_id,
                    message_id,
                    "⚠️ Could not mint an address right now, try again later.",
                )
                .reply_markup(back_keyboard())
                .await?;
            }
        },

        CB_COPY_EMAIL => match deps.registry.last_address(user_id).await {
            Some(last) => {
                bot.send_message(chat_id, format!("`{}`", last))
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
            None => {
                bot.edit_message_text(chat_id, message_id, "❌ No address minted yet")
                    .reply_markup(back_keyboard())
                    .await?;
            }
        },

        CB_MY_EMAILS => {
            let addresses = deps.registry.addresses(user_id).await;
            if addresses.is_empty() {
                bot.edit_message_text(chat_id, message_id, "📁 No addresses minted yet.")
                    .reply_markup(back_keyboard())
                    .await?;
            } else {
                bot.edit_message_text(chat_id, message_id, format_address_list(&addresses))
                    .parse_mode(ParseMode::MarkdownV2)
                    .reply_markup(back_keyboard())
                    .await?;
            }
        }

        CB_BACK => {
            let last = deps.registry.last_address(user_id).await;
            bot.edit_message_text(chat_id, message_id, start_text(last.as_deref()))
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(main_keyboard())
                .await?;
        }

        other => {
            log::debug!("Unknown callback data: {}", other);
        }
    }

    Ok(())
}
