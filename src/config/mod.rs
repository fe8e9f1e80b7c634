//! Configuration management for scatterscan.
//!
//! Provides XDG-compliant settings discovery and the application settings.

mod settings;

pub use settings::{AppSettings, Paths};
