//! Inbound mail: address extraction, delivery routing, webhook surface

pub mod extract;
pub mod router;
pub mod webhook;

// Re-exports for convenience
pub use router::{DeliveryRouter, InboundEmail, Outbound};
pub use webhook::{mail_routes, WebState};
