//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use super::seed::{AwardSeed, NewsSeed, PersonnelSeed};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Portal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Portal identity.
    pub portal: PortalConfig,
    /// Personnel fixture blocks.
    #[serde(default)]
    pub personnel: Vec<PersonnelSeed>,
    /// Award fixture blocks.
    #[serde(default)]
    pub awards: Vec<AwardSeed>,
    /// News fixture blocks.
    #[serde(default)]
    pub news: Vec<NewsSeed>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject seed data that would violate the portal's invariants before
    /// any state is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut nicknames = HashSet::new();
        let mut codes = HashSet::new();
        for seed in &self.personnel {
            if seed.nickname.trim().is_empty() {
                return Err(ConfigError::Invalid("personnel nickname is empty".into()));
            }
            if !nicknames.insert(seed.nickname.trim().to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate personnel nickname: {}",
                    seed.nickname
                )));
            }
            if let Some(code) = &seed.code
                && !codes.insert(code.clone())
            {
                return Err(ConfigError::Invalid(format!(
                    "duplicate access code for: {}",
                    seed.nickname
                )));
            }
        }

        for award in &self.awards {
            if award.name.trim().is_empty() {
                return Err(ConfigError::Invalid("award name is empty".into()));
            }
            for recipient in &award.recipients {
                if !nicknames.contains(&recipient.trim().to_lowercase()) {
                    return Err(ConfigError::Invalid(format!(
                        "award '{}' names unknown recipient: {recipient}",
                        award.name
                    )));
                }
            }
        }

        for post in &self.news {
            if post.title.trim().is_empty() || post.body.trim().is_empty() {
                return Err(ConfigError::Invalid("news post has a blank field".into()));
            }
            if !nicknames.contains(&post.author.trim().to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "news post '{}' names unknown author: {}",
                    post.title, post.author
                )));
            }
        }

        Ok(())
    }
}

/// Portal identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Display name (e.g. "13th Guards Unit Portal").
    pub name: String,
    /// Unit motto shown on the masthead.
    #[serde(default)]
    pub motto: Option<String>,
}
