//! Core module - shared infrastructure for Troika
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, SelectorMode, DEFAULT_TERMINATION_TOKEN};
pub use error::{Result, TroikaError};
pub use types::*;
