//! Inline keyboards and callback data ids

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const CB_CHOOSE_NAME: &str = "choose_name";
pub const CB_RANDOM_EMAIL: &str = "random_email";
pub const CB_COPY_EMAIL: &str = "copy_email";
pub const CB_MY_EMAILS: &str = "my_emails";
pub const CB_BACK: &str = "back";

/// Shorthand for a callback button.
pub fn cb(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), data.into())
}

/// The main menu shown by /start and the back button.
pub fn main_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("✏️ Choose a name", CB_CHOOSE_NAME)],
        vec![cb("🎲 Mint a random address", CB_RANDOM_EMAIL)],
        vec![cb("📋 Copy my address", CB_COPY_EMAIL)],
        vec![cb("📁 My addresses", CB_MY_EMAILS)],
    ])
}

/// A single back button leading to the main menu.
pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("🔙 Back", CB_BACK)]])
}
