//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, PortalConfig) and loading
//! - [`seed`]: Seed data blocks for personnel, awards, and news fixtures

mod seed;
mod types;

pub use seed::{AwardSeed, NewsSeed, PersonnelSeed};
pub use types::{Config, ConfigError, PortalConfig};
