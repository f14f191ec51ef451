use once_cell::sync::Lazy;
use std::env;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Mail domain that every minted address lives under
/// Read from DOMAIN environment variable, normalized to lowercase
/// Default: mail.example.com
pub static DOMAIN: Lazy<String> = Lazy::new(|| {
    env::var("DOMAIN")
        .unwrap_or_else(|_| "mail.example.com".to_string())
        .trim()
        .to_lowercase()
});

/// Public base URL of this deployment (no trailing slash)
/// Read from PUBLIC_URL environment variable; unset means polling mode
pub static PUBLIC_URL: Lazy<Option<String>> = Lazy::new(|| {
    env::var("PUBLIC_URL")
        .ok()
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
});

/// Path the Telegram webhook is mounted on (leading slash enforced)
/// Read from TG_WEBHOOK_PATH environment variable
/// Default: /telegram
pub static TG_WEBHOOK_PATH: Lazy<String> = Lazy::new(|| {
    let raw = env::var("TG_WEBHOOK_PATH").unwrap_or_else(|_| "/telegram".to_string());
    let trimmed = raw.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
});

/// Shared secret Telegram echoes back in X-Telegram-Bot-Api-Secret-Token
/// Read from TG_SECRET_TOKEN environment variable; empty disables the check
pub static TG_SECRET_TOKEN: Lazy<String> =
    Lazy::new(|| env::var("TG_SECRET_TOKEN").unwrap_or_default().trim().to_string());

/// Shared secret the mail provider sends in X-Webhook-Secret
/// Read from MAIL_WEBHOOK_SECRET environment variable; empty disables the check
pub static MAIL_WEBHOOK_SECRET: Lazy<String> =
    Lazy::new(|| env::var("MAIL_WEBHOOK_SECRET").unwrap_or_default().trim().to_string());

/// Path the inbound-mail webhook is mounted on
/// Read from MAIL_WEBHOOK_PATH environment variable
/// Default: /mailgun
pub static MAIL_WEBHOOK_PATH: Lazy<String> = Lazy::new(|| {
    let raw = env::var("MAIL_WEBHOOK_PATH").unwrap_or_else(|_| "/mailgun".to_string());
    let trimmed = raw.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
});

/// Port the HTTP server (mail webhook + health) listens on
/// Read from WEB_PORT environment variable
/// Default: 8080
pub static WEB_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080)
});

/// Which registry storage backend to use: "memory", "snapshot" or "sqlite"
/// Read from STORAGE_BACKEND environment variable
/// Default: sqlite
pub static STORAGE_BACKEND: Lazy<String> = Lazy::new(|| {
    env::var("STORAGE_BACKEND")
        .unwrap_or_else(|_| "sqlite".to_string())
        .trim()
        .to_lowercase()
});

/// SQLite database file path (sqlite backend)
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// JSON snapshot file path (snapshot backend)
/// Read from STATE_FILE_PATH environment variable
/// Default: state.json
pub static STATE_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("STATE_FILE_PATH").unwrap_or_else(|_| "state.json".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    /// The single administrator's Telegram user id
    /// Read from ADMIN_USER_ID environment variable
    /// Defaults to 0 (no admin, admin commands disabled)
    pub static ADMIN_USER_ID: Lazy<i64> = Lazy::new(|| {
        env::var("ADMIN_USER_ID")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    });
}

/// Address minting configuration
pub mod mint {
    /// Length of randomly generated local parts
    pub const RANDOM_LOCAL_PART_LEN: usize = 10;

    /// Maximum length of a sanitized local part
    pub const MAX_LOCAL_PART_LEN: usize = 32;

    /// Attempts at drawing a free random address before giving up
    pub const MAX_ATTEMPTS: u32 = 20;
}

/// Outbound notification configuration
pub mod notify {
    /// Inbound mail bodies longer than this are cut before forwarding
    pub const BODY_TRUNCATE_CHARS: usize = 3500;

    /// Marker appended to a truncated body
    pub const TRUNCATION_MARKER: &str = "\n…";
}

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
