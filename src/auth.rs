//! Role authorization model.
//!
//! Permission checks are centralized here, not scattered through the state
//! managers. Every mutating operation re-derives [`Capabilities`] from the
//! caller's session at entry, so a role downgrade takes effect on the very
//! next action rather than at render time.

use crate::state::PersonnelId;
use serde::{Deserialize, Serialize};

/// Authorization level, independent of rank.
///
/// Ordering implies a read-access superset: `Admin >= Moderator >= User >=
/// Guest`. Write rights are explicit per operation, not purely hierarchical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Moderator,
    Admin,
}

/// Portal pages a role may or may not see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    News,
    Info,
    Divisions,
    Awards,
    Charter,
    /// Personnel directory and rank/role management.
    Personnel,
}

/// A resolved caller identity: personnel id plus role.
///
/// An unauthenticated caller is the *absence* of a session
/// (`Option<&Session>::None`), never a sentinel identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: PersonnelId,
    pub role: Role,
}

/// Capability set derived from a role. Pure query, no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    role: Role,
}

impl Capabilities {
    /// Derive the capabilities of a role.
    pub fn for_role(role: Role) -> Self {
        Self { role }
    }

    /// Derive the capabilities of an optional session; no session is a guest.
    pub fn for_session(session: Option<&Session>) -> Self {
        Self::for_role(session.map_or(Role::Guest, |s| s.role))
    }

    /// Whether this role may view the given page.
    ///
    /// Every page is public except the personnel directory, which is
    /// staff-only.
    pub fn can_view(&self, page: Page) -> bool {
        match page {
            Page::Personnel => self.role >= Role::Moderator,
            _ => true,
        }
    }

    /// Whether this role may author or edit content: news posts, award
    /// definitions and issuance, and avatar moderation decisions.
    pub fn can_edit_content(&self) -> bool {
        self.role >= Role::Moderator
    }

    /// Admin-only rights: registering personnel and changing roles.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Require a moderator-or-admin session for a content mutation.
pub(crate) fn require_editor(session: Option<&Session>) -> crate::error::PortalResult<&Session> {
    match session {
        Some(s) if Capabilities::for_role(s.role).can_edit_content() => Ok(s),
        _ => Err(crate::error::PortalError::Unauthorized),
    }
}

/// Require an admin session.
pub(crate) fn require_admin(session: Option<&Session>) -> crate::error::PortalResult<&Session> {
    match session {
        Some(s) if Capabilities::for_role(s.role).is_admin() => Ok(s),
        _ => Err(crate::error::PortalError::Unauthorized),
    }
}

/// Require an authenticated member: a resolved session whose role is above
/// guest. A session downgraded to `Role::Guest` is refused here just like a
/// missing one.
pub(crate) fn require_member(session: Option<&Session>) -> crate::error::PortalResult<&Session> {
    match session {
        Some(s) if s.role > Role::Guest => Ok(s),
        _ => Err(crate::error::PortalError::Unauthorized),
    }
}
