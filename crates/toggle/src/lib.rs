//! Toggle - demo component built on auto-controlled state
//!
//! This crate provides:
//! - [`app::ToggleApp`], a button/checkbox component whose `active` and
//!   `level` fields can be controlled by its owner or left to the component
//! - Layered session configuration (defaults, TOML file, environment)
//! - Scripted sessions that replay clicks and prop changes against the component

pub mod app;
pub mod config;
pub mod session;

pub use app::{ToggleApp, ToggleProps};
pub use config::{ConfigError, ToggleConfig};
pub use session::{OutputFormat, Session, Step, StepParseError};
