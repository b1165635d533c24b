//! Core domain + application logic for the Secure Bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and MongoDB live
//! behind ports (traits) implemented in adapter crates.

pub mod approval;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod processor;
pub mod supervisor;

pub use errors::{Error, Result};
