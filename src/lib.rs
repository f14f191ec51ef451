//! Mailcloak: Telegram bot that mints disposable email addresses at a
//! fixed domain and relays inbound mail back to the owning user.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, and common utilities
//! - `storage`: the registry's persistence backends (memory, snapshot, SQLite)
//! - `registry`: the address-ownership registry and block-list
//! - `mail`: inbound mail extraction, delivery routing, and the webhook
//! - `telegram`: bot integration and handlers

pub mod cli;
pub mod core;
pub mod mail;
pub mod registry;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use crate::mail::{DeliveryRouter, InboundEmail, Outbound};
pub use crate::registry::Registry;
pub use crate::storage::{RegistryState, StorageBackend};
