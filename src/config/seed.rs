//! Seed data blocks.
//!
//! The portal holds all entities in transient in-process state; these blocks
//! are the declarative replacement for hard-coded sample data. Timestamps
//! are RFC 3339 strings (quoted in TOML).

use crate::auth::Role;
use crate::ranks::Rank;
use chrono::{DateTime, Utc};
use serde::Deserialize;

fn default_role() -> Role {
    Role::User
}

/// A `[[personnel]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonnelSeed {
    /// Access code; generated when omitted.
    pub code: Option<String>,
    pub nickname: String,
    pub rank: Rank,
    /// Date of the last rank change; defaults to load time.
    pub rank_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: String,
    /// Date of the last position change; defaults to `rank_date`.
    pub position_date: Option<DateTime<Utc>>,
    #[serde(default = "default_role")]
    pub role: Role,
    pub bio: Option<String>,
}

/// An `[[awards]]` block. Recipients are seed nicknames.
#[derive(Debug, Clone, Deserialize)]
pub struct AwardSeed {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// A `[[news]]` block. The author is a seed nickname.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsSeed {
    pub title: String,
    pub body: String,
    pub author: String,
    pub date: Option<DateTime<Utc>>,
    pub image: Option<String>,
}
