//! garrisond - Garrison Portal personnel and content authorization core.
//!
//! An in-memory core for a role-playing military community's unit portal:
//! the role capability model, rank-promotion eligibility, and the moderated
//! content workflows (avatar approval, award issuance, news reactions).
//! Rendering is an external collaborator; this crate exposes command/query
//! functions over plain semantic values and returns entities or named
//! failures.

pub mod auth;
pub mod config;
pub mod error;
pub mod ranks;
pub mod state;

pub use auth::{Capabilities, Page, Role, Session};
pub use error::{PortalError, PortalResult};
pub use ranks::{RANK_LADDER, Rank, is_promotion_due};
pub use state::Portal;
