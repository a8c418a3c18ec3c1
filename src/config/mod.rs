//! Configuration management for portsweep.
//!
//! Provides XDG-compliant settings storage and loading.

mod settings;

pub use settings::{AppSettings, Paths};
