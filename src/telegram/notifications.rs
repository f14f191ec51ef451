//! Best-effort admin notifications

use teloxide::prelude::*;

use crate::core::config;

/// Tell the admin the bot is up. Failures are logged and ignored; a dead
/// notification must not stop startup.
pub async fn notify_admin_startup(bot: &Bot) {
    let admin = *config::admin::ADMIN_USER_ID;
    if admin == 0 {
        return;
    }

    let mut text = String::from("✅ Bot started");
    if let Some(public) = config::PUBLIC_URL.as_ref() {
        text.push_str(&format!("\nWebhook: {}{}", public, config::TG_WEBHOOK_PATH.as_str()));
    }

    if let Err(e) = bot.send_message(ChatId(admin), text).await {
        log::warn!("Failed to send startup notification to admin: {}", e);
    }
}
