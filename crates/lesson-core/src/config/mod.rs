//! Configuration loading for the lesson player.
//!
//! All tunable playback settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back to
//! sensible defaults so a lesson can still play.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{AppConfig, LogLevel};
