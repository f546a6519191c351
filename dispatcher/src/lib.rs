//! Release Dispatcher Library
//!
//! Receives "release published" webhooks, authenticates and filters them, and
//! hands the released versions to a single deployment worker through a
//! bounded queue.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod models;
pub mod queue;
pub mod server;
pub mod settings;
pub mod status;
pub mod utils;
pub mod webhook;
pub mod workers;
