//! Personnel directory state and behavior.
//!
//! The `PersonnelManager` owns every personnel record and the avatar
//! moderation workflow. Callers never touch the collections directly; all
//! mutation goes through the gated operations so the uniqueness invariants
//! hold.

use crate::auth::{Role, Session, require_admin, require_editor, require_member};
use crate::error::{PortalError, PortalResult};
use crate::ranks::{self, Rank};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Length of a generated access code.
const ACCESS_CODE_LEN: usize = 8;

/// Unique identity of a personnel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonnelId(Uuid);

impl PersonnelId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PersonnelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An unresolved avatar submission attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAvatar {
    /// Proposed image reference (data URI or URL).
    pub image: String,
    pub submitted_at: DateTime<Utc>,
}

/// A member of the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonnelRecord {
    pub id: PersonnelId,
    /// Login credential, matched on authentication.
    pub code: String,
    /// Display nickname, unique within the directory.
    pub nickname: String,
    pub rank: Rank,
    pub rank_changed_at: DateTime<Utc>,
    /// Free-text duty title.
    pub position: String,
    pub position_changed_at: DateTime<Utc>,
    pub role: Role,
    pub bio: Option<String>,
    /// Approved avatar reference.
    pub avatar: Option<String>,
    /// Unresolved moderation request, at most one per record.
    pub pending_avatar: Option<PendingAvatar>,
    /// Names of awards held, kept in sync by the awards registry.
    pub awards: BTreeSet<String>,
}

/// One entry of the derived avatar moderation queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarRequest {
    pub id: PersonnelId,
    pub nickname: String,
    pub image: String,
    pub submitted_at: DateTime<Utc>,
}

/// Partial update for `update_assignment`. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AssignmentChange {
    pub rank: Option<Rank>,
    pub position: Option<String>,
    pub role: Option<Role>,
}

/// Manages all personnel-related state.
///
/// The PersonnelManager is responsible for:
/// - Tracking records and their unique nickname / access-code indexes.
/// - Admin-gated registration and assignment changes.
/// - The avatar moderation workflow and its derived queue.
/// - Resolving access codes to sessions.
pub struct PersonnelManager {
    records: DashMap<PersonnelId, PersonnelRecord>,
    /// Lowercased nickname -> id.
    nicknames: DashMap<String, PersonnelId>,
    /// Access code -> id.
    codes: DashMap<String, PersonnelId>,
    /// Registration order, the directory's canonical listing order.
    roster: RwLock<Vec<PersonnelId>>,
}

impl PersonnelManager {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            nicknames: DashMap::new(),
            codes: DashMap::new(),
            roster: RwLock::new(Vec::new()),
        }
    }

    // ========================================================================
    // Directory operations
    // ========================================================================

    /// Register a new member. Admin only.
    ///
    /// Assigns a freshly generated unique access code and sets both change
    /// timestamps to the creation time.
    pub fn register(
        &self,
        session: Option<&Session>,
        nickname: &str,
        rank: Rank,
        position: &str,
        role: Role,
    ) -> PortalResult<PersonnelRecord> {
        require_admin(session).inspect_err(|_| {
            debug!(nickname = %nickname, "Registration denied: caller is not admin");
        })?;

        let now = Utc::now();
        let code = self.generate_access_code();
        self.insert_record(nickname, code, rank, now, position, now, role, None)
    }

    /// Insert a record directly, enforcing uniqueness but no role gate.
    ///
    /// Used by registration and by config seeding (an operator fixture load,
    /// not a user action).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_record(
        &self,
        nickname: &str,
        code: String,
        rank: Rank,
        rank_changed_at: DateTime<Utc>,
        position: &str,
        position_changed_at: DateTime<Utc>,
        role: Role,
        bio: Option<String>,
    ) -> PortalResult<PersonnelRecord> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(PortalError::InvalidInput("nickname is empty".into()));
        }

        let nick_lower = nickname.to_lowercase();
        if self.nicknames.contains_key(&nick_lower) {
            return Err(PortalError::DuplicateIdentity(nickname.to_string()));
        }

        let record = PersonnelRecord {
            id: PersonnelId::generate(),
            code,
            nickname: nickname.to_string(),
            rank,
            rank_changed_at,
            position: position.to_string(),
            position_changed_at,
            role,
            bio,
            avatar: None,
            pending_avatar: None,
            awards: BTreeSet::new(),
        };

        self.nicknames.insert(nick_lower, record.id);
        self.codes.insert(record.code.clone(), record.id);
        self.records.insert(record.id, record.clone());
        self.roster.write().push(record.id);

        info!(id = %record.id, nickname = %record.nickname, rank = %record.rank, "Personnel registered");
        Ok(record)
    }

    /// Change a member's rank, position, or role.
    ///
    /// Role changes are admin-only; rank and position changes require
    /// moderator-or-admin. A rank change resets the rank timestamp (which is
    /// what makes the promotion flag drop immediately after a promotion is
    /// granted); a position change resets its own timestamp independently.
    pub fn update_assignment(
        &self,
        session: Option<&Session>,
        id: PersonnelId,
        change: AssignmentChange,
    ) -> PortalResult<PersonnelRecord> {
        if change.role.is_some() {
            require_admin(session)?;
        } else {
            require_editor(session)?;
        }

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| PortalError::NotFound(format!("personnel {id}")))?;

        let now = Utc::now();
        if let Some(rank) = change.rank
            && rank != record.rank
        {
            info!(id = %id, from = %record.rank, to = %rank, "Rank changed");
            record.rank = rank;
            record.rank_changed_at = now;
        }
        if let Some(position) = change.position
            && position != record.position
        {
            record.position = position;
            record.position_changed_at = now;
        }
        if let Some(role) = change.role
            && role != record.role
        {
            info!(id = %id, role = ?role, "Role changed");
            record.role = role;
        }

        Ok(record.clone())
    }

    /// Edit a member's biography: self-service, or moderator-or-admin for
    /// anyone's record.
    pub fn update_bio(
        &self,
        session: Option<&Session>,
        id: PersonnelId,
        bio: Option<String>,
    ) -> PortalResult<()> {
        let caller = require_member(session)?;
        if caller.id != id {
            require_editor(session)?;
        }

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| PortalError::NotFound(format!("personnel {id}")))?;
        record.bio = bio;
        Ok(())
    }

    /// Case-insensitive substring search against nickname or rank name.
    ///
    /// Stable: results preserve directory order. An empty term returns the
    /// whole roster.
    pub fn search(&self, term: &str) -> Vec<PersonnelRecord> {
        let needle = term.trim().to_lowercase();
        self.roster
            .read()
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| {
                needle.is_empty()
                    || r.nickname.to_lowercase().contains(&needle)
                    || r.rank.name().to_lowercase().contains(&needle)
            })
            .map(|r| r.value().clone())
            .collect()
    }

    /// Look up a single record.
    pub fn get(&self, id: PersonnelId) -> Option<PersonnelRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Whether a record exists.
    pub fn contains(&self, id: PersonnelId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of registered members.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a promotion is due for the record, evaluated at `now`.
    ///
    /// Never cached: delegates to the rank ladder on every call.
    pub fn promotion_due(&self, id: PersonnelId, now: DateTime<Utc>) -> PortalResult<bool> {
        let record = self
            .records
            .get(&id)
            .ok_or_else(|| PortalError::NotFound(format!("personnel {id}")))?;
        Ok(ranks::is_promotion_due(record.rank, record.rank_changed_at, now))
    }

    /// Resolve an access code to a session.
    pub fn authenticate(&self, code: &str) -> Option<Session> {
        let id = *self.codes.get(code)?;
        let record = self.records.get(&id)?;
        Some(Session {
            id,
            role: record.role,
        })
    }

    pub(crate) fn generate_access_code(&self) -> String {
        loop {
            let code: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(ACCESS_CODE_LEN)
                .map(|c| (c as char).to_ascii_uppercase())
                .collect();
            if !self.codes.contains_key(&code) {
                return code;
            }
        }
    }

    // ========================================================================
    // Avatar moderation workflow
    // ========================================================================

    /// Submit a new avatar for moderation.
    ///
    /// Members may only submit for their own record. Submitting while a
    /// request is already pending overwrites the pending value and timestamp;
    /// the moderation queue never holds two entries for one record.
    pub fn submit_avatar(
        &self,
        session: Option<&Session>,
        id: PersonnelId,
        image: &str,
    ) -> PortalResult<()> {
        let caller = require_member(session)?;
        if caller.id != id {
            debug!(caller = %caller.id, target = %id, "Avatar submission denied: not own record");
            return Err(PortalError::Unauthorized);
        }
        if image.trim().is_empty() {
            return Err(PortalError::InvalidInput("avatar reference is empty".into()));
        }

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| PortalError::NotFound(format!("personnel {id}")))?;
        record.pending_avatar = Some(PendingAvatar {
            image: image.to_string(),
            submitted_at: Utc::now(),
        });
        info!(id = %id, "Avatar submitted for moderation");
        Ok(())
    }

    /// Approve the pending avatar: it becomes the visible avatar and the
    /// request is resolved. Re-applying to a resolved record is an error,
    /// not a silent success.
    pub fn approve_avatar(&self, session: Option<&Session>, id: PersonnelId) -> PortalResult<()> {
        require_editor(session)?;

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| PortalError::NotFound(format!("personnel {id}")))?;
        let pending = record
            .pending_avatar
            .take()
            .ok_or(PortalError::NoPendingRequest)?;
        record.avatar = Some(pending.image);
        info!(id = %id, "Avatar approved");
        Ok(())
    }

    /// Reject the pending avatar: the request is dropped and the visible
    /// avatar is left unchanged.
    pub fn reject_avatar(&self, session: Option<&Session>, id: PersonnelId) -> PortalResult<()> {
        require_editor(session)?;

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| PortalError::NotFound(format!("personnel {id}")))?;
        if record.pending_avatar.take().is_none() {
            return Err(PortalError::NoPendingRequest);
        }
        info!(id = %id, "Avatar rejected");
        Ok(())
    }

    /// The moderation queue, derived by scanning for unresolved requests.
    ///
    /// Computed on demand so it can never drift from the records themselves.
    pub fn pending_avatar_requests(&self) -> Vec<AvatarRequest> {
        self.roster
            .read()
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter_map(|r| {
                r.pending_avatar.as_ref().map(|p| AvatarRequest {
                    id: r.id,
                    nickname: r.nickname.clone(),
                    image: p.image.clone(),
                    submitted_at: p.submitted_at,
                })
            })
            .collect()
    }

    // ========================================================================
    // Badge list sync (driven by the awards registry)
    // ========================================================================

    pub(crate) fn add_award_badge(&self, id: PersonnelId, award_name: &str) {
        if let Some(mut record) = self.records.get_mut(&id) {
            record.awards.insert(award_name.to_string());
        }
    }

    pub(crate) fn remove_award_badge(&self, id: PersonnelId, award_name: &str) {
        if let Some(mut record) = self.records.get_mut(&id) {
            record.awards.remove(award_name);
        }
    }
}

impl Default for PersonnelManager {
    fn default() -> Self {
        Self::new()
    }
}
