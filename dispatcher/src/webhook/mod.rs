//! Webhook authentication and filtering

pub mod filter;
pub mod signature;

/// Header carrying the event type, e.g. `release`
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the `sha256=<hex>` HMAC of the raw body
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
