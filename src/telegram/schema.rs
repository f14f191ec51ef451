//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::telegram::admin::{handle_block_command, handle_unblock_command, is_admin};
use crate::telegram::bot::Command;
use crate::telegram::commands::handle_start_command;
use crate::telegram::menu::handle_menu_callback;
use crate::telegram::messages::handle_text_message;
use crate::telegram::types::{HandlerDeps, HandlerError};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Returns a handler tree usable with teloxide's Dispatcher. The same
/// schema serves production and integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_block = deps.clone();
    let deps_unblock = deps.clone();
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Hidden admin commands (not in the Command enum)
        .branch(block_handler(deps_block))
        .branch(unblock_handler(deps_unblock))
        // Command handler
        .branch(command_handler(deps_commands))
        // Free-text handler (name entry, admin target entry)
        .branch(message_handler(deps_messages))
        // Callback query handler
        .branch(callback_handler(deps_callback))
}

/// Handler for the hidden /block admin command
fn block_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.starts_with("/block")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let user_id = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0);
                let message_text = msg.text().unwrap_or_default();

                if let Err(e) = handle_block_command(&bot, msg.chat.id, user_id, message_text, &deps).await {
                    log::error!("/block handler failed for user {}: {}", user_id, e);
                }
                Ok(())
            }
        })
}

/// Handler for the hidden /unblock admin command
fn unblock_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.starts_with("/unblock")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let user_id = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0);
                let message_text = msg.text().unwrap_or_default();

                if let Err(e) = handle_unblock_command(&bot, msg.chat.id, user_id, message_text, &deps).await {
                    log::error!("/unblock handler failed for user {}: {}", user_id, e);
                }
                Ok(())
            }
        })
}

/// Handler for bot commands (/start)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let user_id = msg.chat.id.0;
                if deps.registry.is_blocked(user_id).await && !is_admin(user_id) {
                    log::debug!("Suppressing command from blocked user {}", user_id);
                    return Ok(());
                }

                match cmd {
                    Command::Start => {
                        handle_start_command(&bot, &msg, &deps).await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for regular text messages
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| !text.starts_with('/')).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let user_id = msg.chat.id.0;
                if deps.registry.is_blocked(user_id).await && !is_admin(user_id) {
                    log::debug!("Suppressing message from blocked user {}", user_id);
                    return Ok(());
                }

                if let Err(e) = handle_text_message(bot, msg, deps).await {
                    log::error!("Error handling message: {:?}", e);
                }
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let result: teloxide::RequestError = match handle_menu_callback(bot, q, deps).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            Err(Box::new(result) as HandlerError)
        }
    })
}
