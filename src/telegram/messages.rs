//! Free-text message handling: the per-owner interaction state machine.
//!
//! A plain text message only means something when the owner is mid-flow:
//! entering a name for a mint, or (admin) entering a block/unblock target.
//! Idle owners' chatter is ignored.

use teloxide::prelude::*;

use crate::core::error::AppError;
use crate::telegram::admin::{apply_block, apply_unblock, is_admin, parse_target_id};
use crate::telegram::keyboards::back_keyboard;
use crate::telegram::outbound::send_markdown_v2;
use crate::telegram::state::UserState;
use crate::telegram::types::HandlerDeps;

pub async fn handle_text_message(bot: Bot, msg: Message, deps: HandlerDeps) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = msg.chat.id.0;

    let Some(state) = deps.interaction.get(user_id) else {
        return Ok(());
    };

    match state {
        UserState::AwaitingName => {
            // One shot per prompt: the flag dies with this message whether
            // the mint succeeds or not; a retry restarts from the button.
            deps.interaction.clear(user_id);

            match deps.registry.mint_named(user_id, text).await {
                Ok(address) => {
                    send_markdown_v2(
                        &bot,
                        msg.chat.id,
                        format!("New address minted ✅\n\n`{}`", address),
                        Some(back_keyboard()),
                    )
                    .await?;
                }
                Err(AppError::InvalidName) => {
                    bot.send_message(msg.chat.id, "❌ That name is not usable. Tap ✏️ Choose a name to try again.")
                        .reply_markup(back_keyboard())
                        .await?;
                }
                Err(AppError::NameTaken) => {
                    bot.send_message(
                        msg.chat.id,
                        "❌ That address is already taken. Tap ✏️ Choose a name to pick another.",
                    )
                    .reply_markup(back_keyboard())
                    .await?;
                }
                Err(e) => {
                    log::error!("Named mint failed for user {}: {}", user_id, e);
                    bot.send_message(msg.chat.id, "⚠️ Something went wrong, try again later.")
                        .reply_markup(back_keyboard())
                        .await?;
                }
            }
        }

        UserState::AwaitingBlockTarget | UserState::AwaitingUnblockTarget => {
            if !is_admin(user_id) {
                // Stale state from a revoked admin id; drop it.
                deps.interaction.clear(user_id);
                return Ok(());
            }

            match parse_target_id(text) {
                // Unparsable input re-prompts and keeps the awaiting state.
                None => {
                    bot.send_message(
                        msg.chat.id,
                        "That doesn't look like a user id. Send a number of at least 5 digits:",
                    )
                    .await?;
                }
                Some(target) => {
                    deps.interaction.clear(user_id);
                    if state == UserState::AwaitingBlockTarget {
                        apply_block(&bot, msg.chat.id, target, &deps).await?;
                    } else {
                        apply_unblock(&bot, msg.chat.id, target, &deps).await?;
                    }
                }
            }
        }
    }

    Ok(())
}
