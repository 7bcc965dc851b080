//! Domain managers for portal state.
//!
//! Each manager owns one domain of the portal's in-memory state; the
//! [`Portal`] aggregate wires them together, routes issuance events into the
//! badge lists, and resolves access codes to sessions.

pub mod awards;
pub mod news;
pub mod personnel;

pub use awards::{Award, AwardGranted, AwardId, AwardObserver, AwardsManager, LedgerEntry};
pub use news::{NewsManager, NewsPost, PostChange, PostId};
pub use personnel::{
    AssignmentChange, AvatarRequest, PendingAvatar, PersonnelId, PersonnelManager, PersonnelRecord,
};

use crate::auth::Session;
use crate::config::Config;
use crate::error::{PortalError, PortalResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Keeps personnel badge lists in sync with the awards registry.
struct BadgeSync {
    personnel: Arc<PersonnelManager>,
}

impl AwardObserver for BadgeSync {
    fn on_award_granted(&self, event: &AwardGranted) {
        self.personnel
            .add_award_badge(event.recipient, &event.award_name);
    }

    fn on_award_revoked(&self, recipient: PersonnelId, award_name: &str) {
        self.personnel.remove_award_badge(recipient, award_name);
    }
}

/// The portal's shared state: all managers plus authentication.
pub struct Portal {
    pub personnel: Arc<PersonnelManager>,
    pub awards: AwardsManager,
    pub news: NewsManager,
}

impl Portal {
    /// Create an empty portal with the award observer wired up.
    pub fn new() -> Self {
        let personnel = Arc::new(PersonnelManager::new());
        let mut awards = AwardsManager::new();
        awards.set_observer(Arc::new(BadgeSync {
            personnel: Arc::clone(&personnel),
        }));
        Self {
            personnel,
            awards,
            news: NewsManager::new(),
        }
    }

    /// Build a portal from validated seed config.
    ///
    /// Seeding is the operator's fixture load, not a user action: it bypasses
    /// the role gates but still enforces every uniqueness invariant.
    pub fn from_config(config: &Config) -> PortalResult<Self> {
        let portal = Self::new();
        let loaded_at = Utc::now();

        for seed in &config.personnel {
            let code = seed
                .code
                .clone()
                .unwrap_or_else(|| portal.personnel.generate_access_code());
            let rank_date = seed.rank_date.unwrap_or(loaded_at);
            portal.personnel.insert_record(
                &seed.nickname,
                code,
                seed.rank,
                rank_date,
                &seed.position,
                seed.position_date.unwrap_or(rank_date),
                seed.role,
                seed.bio.clone(),
            )?;
        }

        for seed in &config.awards {
            let award = portal.awards.insert_award(&seed.name, &seed.icon)?;
            for nickname in &seed.recipients {
                // Validation guarantees the nickname resolves.
                let record = portal
                    .personnel
                    .search(nickname)
                    .into_iter()
                    .find(|r| r.nickname.eq_ignore_ascii_case(nickname.trim()))
                    .ok_or_else(|| PortalError::NotFound(format!("personnel {nickname}")))?;
                portal.awards.seed_grant(award.id, record.id, loaded_at)?;
            }
        }

        // Config order is oldest-first; push_front makes the last block the
        // newest post, matching the feed's most-recent-first order.
        for seed in &config.news {
            let author = portal
                .personnel
                .search(&seed.author)
                .into_iter()
                .find(|r| r.nickname.eq_ignore_ascii_case(seed.author.trim()))
                .ok_or_else(|| PortalError::NotFound(format!("personnel {}", seed.author)))?;
            portal.news.insert_post(
                &seed.title,
                &seed.body,
                seed.image.clone(),
                author.id,
                seed.date.unwrap_or(loaded_at),
            )?;
        }

        info!(
            personnel = portal.personnel.len(),
            awards = portal.awards.len(),
            news = portal.news.len(),
            "Portal seeded from config"
        );
        Ok(portal)
    }

    /// Resolve a presented access code to a session.
    ///
    /// The trivial shared-secret lookup of spec'd authentication; every
    /// subsequent operation re-checks the session's role at entry.
    pub fn login(&self, code: &str) -> Option<Session> {
        self.personnel.authenticate(code)
    }

    /// Issue an award, verifying the recipient actually exists in the
    /// directory before touching the ledger.
    pub fn grant_award(
        &self,
        session: Option<&Session>,
        award_id: AwardId,
        recipient: PersonnelId,
        now: DateTime<Utc>,
    ) -> PortalResult<AwardGranted> {
        if !self.personnel.contains(recipient) {
            return Err(PortalError::NotFound(format!("personnel {recipient}")));
        }
        self.awards.grant(session, award_id, recipient, now)
    }

    /// The recipient-selection surface for an award: every member not
    /// already in its ledger, in roster order.
    pub fn eligible_recipients(&self, award_id: AwardId) -> PortalResult<Vec<PersonnelRecord>> {
        let award = self
            .awards
            .get(award_id)
            .ok_or_else(|| PortalError::NotFound(format!("award {award_id}")))?;
        Ok(self
            .personnel
            .search("")
            .into_iter()
            .filter(|r| !award.holds(r.id))
            .collect())
    }
}

impl Default for Portal {
    fn default() -> Self {
        Self::new()
    }
}
