//! Awards registry: definitions, recipient ledgers, and issuance events.

use crate::auth::{Session, require_editor};
use crate::error::{PortalError, PortalResult};
use crate::state::PersonnelId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique identity of an award definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AwardId(Uuid);

impl AwardId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for AwardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One issuance recorded in an award's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub recipient: PersonnelId,
    pub granted_at: DateTime<Utc>,
}

/// An award definition and its recipient ledger.
///
/// Invariant: a recipient appears at most once in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub id: AwardId,
    pub name: String,
    /// Icon glyph shown next to the name (e.g. a medal emoji).
    pub icon: String,
    pub ledger: Vec<LedgerEntry>,
}

impl Award {
    /// Whether the recipient already holds this award.
    pub fn holds(&self, recipient: PersonnelId) -> bool {
        self.ledger.iter().any(|e| e.recipient == recipient)
    }
}

/// Outbound signal emitted when an award is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardGranted {
    pub recipient: PersonnelId,
    pub award_id: AwardId,
    pub award_name: String,
    pub award_icon: String,
}

/// Observer for issuance events (Portal wires this to the badge list).
pub trait AwardObserver: Send + Sync {
    fn on_award_granted(&self, event: &AwardGranted);
    fn on_award_revoked(&self, recipient: PersonnelId, award_name: &str);
}

/// Manages award definitions and their ledgers.
pub struct AwardsManager {
    awards: DashMap<AwardId, Award>,
    /// Creation order, the registry's canonical listing order.
    order: RwLock<Vec<AwardId>>,
    observer: Option<Arc<dyn AwardObserver>>,
}

impl AwardsManager {
    pub fn new() -> Self {
        Self {
            awards: DashMap::new(),
            order: RwLock::new(Vec::new()),
            observer: None,
        }
    }

    /// Set the issuance observer.
    pub fn set_observer(&mut self, observer: Arc<dyn AwardObserver>) {
        self.observer = Some(observer);
    }

    /// Create a new award definition. Moderator-or-admin only.
    pub fn create_award(
        &self,
        session: Option<&Session>,
        name: &str,
        icon: &str,
    ) -> PortalResult<Award> {
        require_editor(session)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PortalError::InvalidInput("award name is empty".into()));
        }

        let award = Award {
            id: AwardId::generate(),
            name: name.to_string(),
            icon: icon.to_string(),
            ledger: Vec::new(),
        };
        self.awards.insert(award.id, award.clone());
        self.order.write().push(award.id);
        info!(id = %award.id, name = %award.name, "Award created");
        Ok(award)
    }

    /// Delete an award definition and its ledger. Moderator-or-admin only.
    ///
    /// Every holder is reported to the observer so no badge outlives the
    /// award it came from.
    pub fn delete_award(&self, session: Option<&Session>, id: AwardId) -> PortalResult<()> {
        require_editor(session)?;
        let (_, award) = self
            .awards
            .remove(&id)
            .ok_or_else(|| PortalError::NotFound(format!("award {id}")))?;
        self.order.write().retain(|a| *a != id);
        if let Some(observer) = &self.observer {
            for entry in &award.ledger {
                observer.on_award_revoked(entry.recipient, &award.name);
            }
        }
        info!(id = %id, name = %award.name, "Award deleted");
        Ok(())
    }

    /// Issue an award to a recipient.
    ///
    /// The check-then-append runs under the award's entry lock, so the
    /// at-most-once-per-recipient invariant holds even with threaded callers.
    /// Does not verify the recipient exists in the directory; external
    /// callers issue through [`Portal::grant_award`](crate::state::Portal),
    /// which does.
    pub(crate) fn grant(
        &self,
        session: Option<&Session>,
        award_id: AwardId,
        recipient: PersonnelId,
        now: DateTime<Utc>,
    ) -> PortalResult<AwardGranted> {
        require_editor(session).inspect_err(|_| {
            debug!(award = %award_id, recipient = %recipient, "Award grant denied");
        })?;

        let event = self.append_entry(award_id, recipient, now)?;
        info!(award = %event.award_name, recipient = %recipient, "Award granted");
        if let Some(observer) = &self.observer {
            observer.on_award_granted(&event);
        }
        Ok(event)
    }

    /// Append a ledger entry under the award's entry lock.
    fn append_entry(
        &self,
        award_id: AwardId,
        recipient: PersonnelId,
        granted_at: DateTime<Utc>,
    ) -> PortalResult<AwardGranted> {
        let mut award = self
            .awards
            .get_mut(&award_id)
            .ok_or_else(|| PortalError::NotFound(format!("award {award_id}")))?;
        if award.holds(recipient) {
            return Err(PortalError::AlreadyAwarded);
        }
        award.ledger.push(LedgerEntry {
            recipient,
            granted_at,
        });
        Ok(AwardGranted {
            recipient,
            award_id,
            award_name: award.name.clone(),
            award_icon: award.icon.clone(),
        })
    }

    /// Remove a recipient's ledger entry.
    pub fn revoke(
        &self,
        session: Option<&Session>,
        award_id: AwardId,
        recipient: PersonnelId,
    ) -> PortalResult<()> {
        require_editor(session)?;

        let award_name = {
            let mut award = self
                .awards
                .get_mut(&award_id)
                .ok_or_else(|| PortalError::NotFound(format!("award {award_id}")))?;
            if !award.holds(recipient) {
                return Err(PortalError::NotAwarded);
            }
            award.ledger.retain(|e| e.recipient != recipient);
            award.name.clone()
        };

        info!(award = %award_name, recipient = %recipient, "Award revoked");
        if let Some(observer) = &self.observer {
            observer.on_award_revoked(recipient, &award_name);
        }
        Ok(())
    }

    /// Seed an award directly, bypassing the role gate (config fixture load).
    pub(crate) fn insert_award(&self, name: &str, icon: &str) -> PortalResult<Award> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PortalError::InvalidInput("award name is empty".into()));
        }
        let award = Award {
            id: AwardId::generate(),
            name: name.to_string(),
            icon: icon.to_string(),
            ledger: Vec::new(),
        };
        self.awards.insert(award.id, award.clone());
        self.order.write().push(award.id);
        Ok(award)
    }

    /// Seed a ledger entry, bypassing the role gate but still enforcing
    /// per-recipient uniqueness and notifying the observer.
    pub(crate) fn seed_grant(
        &self,
        award_id: AwardId,
        recipient: PersonnelId,
        granted_at: DateTime<Utc>,
    ) -> PortalResult<()> {
        let event = self.append_entry(award_id, recipient, granted_at)?;
        if let Some(observer) = &self.observer {
            observer.on_award_granted(&event);
        }
        Ok(())
    }

    /// Look up a single award.
    pub fn get(&self, id: AwardId) -> Option<Award> {
        self.awards.get(&id).map(|a| a.value().clone())
    }

    /// All awards in creation order.
    pub fn list(&self) -> Vec<Award> {
        self.order
            .read()
            .iter()
            .filter_map(|id| self.awards.get(id))
            .map(|a| a.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.awards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }
}

impl Default for AwardsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use parking_lot::Mutex;

    fn moderator() -> Session {
        Session {
            id: PersonnelId::generate(),
            role: Role::Moderator,
        }
    }

    #[test]
    fn create_requires_editor() {
        let manager = AwardsManager::new();
        let user = Session {
            id: PersonnelId::generate(),
            role: Role::User,
        };
        assert_eq!(
            manager.create_award(Some(&user), "Medal", "X").unwrap_err(),
            PortalError::Unauthorized
        );
        assert_eq!(
            manager.create_award(None, "Medal", "X").unwrap_err(),
            PortalError::Unauthorized
        );
    }

    #[test]
    fn blank_award_name_is_invalid() {
        let manager = AwardsManager::new();
        let staff = moderator();
        assert_eq!(
            manager.create_award(Some(&staff), "  ", "X").unwrap_err(),
            PortalError::InvalidInput("award name is empty".into())
        );
    }

    #[test]
    fn double_grant_fails_and_keeps_one_ledger_entry() {
        let manager = AwardsManager::new();
        let staff = moderator();
        let award = manager
            .create_award(Some(&staff), "Medal for Valor", "M")
            .unwrap();
        let recipient = PersonnelId::generate();

        manager.grant(Some(&staff), award.id, recipient, Utc::now()).unwrap();
        let err = manager
            .grant(Some(&staff), award.id, recipient, Utc::now())
            .unwrap_err();
        assert_eq!(err, PortalError::AlreadyAwarded);
        assert_eq!(manager.get(award.id).unwrap().ledger.len(), 1);
    }

    #[test]
    fn revoke_without_entry_fails() {
        let manager = AwardsManager::new();
        let staff = moderator();
        let award = manager.create_award(Some(&staff), "Medal", "M").unwrap();

        let err = manager
            .revoke(Some(&staff), award.id, PersonnelId::generate())
            .unwrap_err();
        assert_eq!(err, PortalError::NotAwarded);
    }

    #[test]
    fn grant_then_revoke_round_trip() {
        let manager = AwardsManager::new();
        let staff = moderator();
        let award = manager.create_award(Some(&staff), "Medal", "M").unwrap();
        let recipient = PersonnelId::generate();

        manager.grant(Some(&staff), award.id, recipient, Utc::now()).unwrap();
        manager.revoke(Some(&staff), award.id, recipient).unwrap();
        assert!(manager.get(award.id).unwrap().ledger.is_empty());

        // After revocation a fresh grant is allowed again.
        manager.grant(Some(&staff), award.id, recipient, Utc::now()).unwrap();
    }

    #[test]
    fn observer_sees_grants_and_revocations() {
        #[derive(Default)]
        struct Recorder {
            events: Mutex<Vec<String>>,
        }
        impl AwardObserver for Recorder {
            fn on_award_granted(&self, event: &AwardGranted) {
                self.events.lock().push(format!("+{}", event.award_name));
            }
            fn on_award_revoked(&self, _recipient: PersonnelId, award_name: &str) {
                self.events.lock().push(format!("-{award_name}"));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let mut manager = AwardsManager::new();
        manager.set_observer(recorder.clone());

        let staff = moderator();
        let award = manager.create_award(Some(&staff), "Medal", "M").unwrap();
        let recipient = PersonnelId::generate();
        manager.grant(Some(&staff), award.id, recipient, Utc::now()).unwrap();
        manager.revoke(Some(&staff), award.id, recipient).unwrap();

        assert_eq!(*recorder.events.lock(), vec!["+Medal", "-Medal"]);
    }

    #[test]
    fn list_preserves_creation_order_after_delete() {
        let manager = AwardsManager::new();
        let staff = moderator();
        let a = manager.create_award(Some(&staff), "A", "1").unwrap();
        let b = manager.create_award(Some(&staff), "B", "2").unwrap();
        let c = manager.create_award(Some(&staff), "C", "3").unwrap();

        manager.delete_award(Some(&staff), b.id).unwrap();
        let names: Vec<_> = manager.list().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert!(manager.get(a.id).is_some());
        assert!(manager.get(c.id).is_some());
    }
}
