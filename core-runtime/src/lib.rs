//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the narration core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! This crate contains the runtime utilities the other modules depend on. It
//! establishes the logging conventions and event broadcasting mechanisms used
//! throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
