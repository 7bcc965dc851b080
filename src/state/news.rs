//! News feed and per-user reaction ledger.
//!
//! The feed is most-recent-first. Post bodies may carry lightweight inline
//! markup; the core stores and returns the raw text unchanged and leaves
//! rendering to the caller.

use crate::auth::{Session, require_editor, require_member};
use crate::error::{PortalError, PortalResult};
use crate::state::PersonnelId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};
use tracing::info;
use uuid::Uuid;

/// Unique identity of a news post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostId(Uuid);

impl PostId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An authored post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsPost {
    pub id: PostId,
    pub title: String,
    /// Raw body text, markup included.
    pub body: String,
    pub image: Option<String>,
    pub author: PersonnelId,
    pub published_at: DateTime<Utc>,
    /// Identities that have reacted. The count is derived from this set so
    /// the two can never diverge.
    reacted: HashSet<PersonnelId>,
}

impl NewsPost {
    /// Current reaction count.
    pub fn reactions(&self) -> usize {
        self.reacted.len()
    }

    /// Whether the given identity has reacted to this post.
    pub fn reacted_by(&self, id: PersonnelId) -> bool {
        self.reacted.contains(&id)
    }
}

/// Partial update for `edit`. Absent fields are left untouched.
///
/// The image is doubly optional: `Some(Some(_))` replaces it,
/// `Some(None)` removes it, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct PostChange {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<Option<String>>,
}

/// Manages the news feed.
pub struct NewsManager {
    /// Most recent post first.
    feed: RwLock<VecDeque<NewsPost>>,
}

impl NewsManager {
    pub fn new() -> Self {
        Self {
            feed: RwLock::new(VecDeque::new()),
        }
    }

    /// Publish a post, prepending it to the feed. Moderator-or-admin only;
    /// the session identity becomes the author.
    pub fn publish(
        &self,
        session: Option<&Session>,
        title: &str,
        body: &str,
        image: Option<String>,
    ) -> PortalResult<NewsPost> {
        let author = require_editor(session)?;
        if title.trim().is_empty() {
            return Err(PortalError::InvalidInput("title is empty".into()));
        }
        if body.trim().is_empty() {
            return Err(PortalError::InvalidInput("body is empty".into()));
        }

        let post = NewsPost {
            id: PostId::generate(),
            title: title.to_string(),
            body: body.to_string(),
            image,
            author: author.id,
            published_at: Utc::now(),
            reacted: HashSet::new(),
        };
        info!(id = %post.id, title = %post.title, "News published");
        self.feed.write().push_front(post.clone());
        Ok(post)
    }

    /// Edit a post's title, body, or image. Moderator-or-admin only.
    pub fn edit(
        &self,
        session: Option<&Session>,
        id: PostId,
        change: PostChange,
    ) -> PortalResult<NewsPost> {
        require_editor(session)?;
        if change.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(PortalError::InvalidInput("title is empty".into()));
        }
        if change.body.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(PortalError::InvalidInput("body is empty".into()));
        }

        let mut feed = self.feed.write();
        let post = feed
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PortalError::NotFound(format!("post {id}")))?;
        if let Some(title) = change.title {
            post.title = title;
        }
        if let Some(body) = change.body {
            post.body = body;
        }
        if let Some(image) = change.image {
            post.image = image;
        }
        Ok(post.clone())
    }

    /// Delete a post. Moderator-or-admin only.
    pub fn delete(&self, session: Option<&Session>, id: PostId) -> PortalResult<()> {
        require_editor(session)?;
        let mut feed = self.feed.write();
        let before = feed.len();
        feed.retain(|p| p.id != id);
        if feed.len() == before {
            return Err(PortalError::NotFound(format!("post {id}")));
        }
        info!(id = %id, "News deleted");
        Ok(())
    }

    /// Strict reaction toggle for an authenticated member.
    ///
    /// First call reacts, second call by the same identity un-reacts. The
    /// check-then-flip runs under the feed lock, so repeated calls can never
    /// double-count. Returns the post's new reaction count.
    pub fn toggle_reaction(&self, session: Option<&Session>, id: PostId) -> PortalResult<usize> {
        let caller = require_member(session)?;

        let mut feed = self.feed.write();
        let post = feed
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PortalError::NotFound(format!("post {id}")))?;
        if !post.reacted.insert(caller.id) {
            post.reacted.remove(&caller.id);
        }
        Ok(post.reacted.len())
    }

    /// Look up a single post.
    pub fn get(&self, id: PostId) -> Option<NewsPost> {
        self.feed.read().iter().find(|p| p.id == id).cloned()
    }

    /// The whole feed, most recent first.
    pub fn feed(&self) -> Vec<NewsPost> {
        self.feed.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.feed.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.read().is_empty()
    }

    /// Seed a post directly, bypassing the role gate (config fixture load).
    pub(crate) fn insert_post(
        &self,
        title: &str,
        body: &str,
        image: Option<String>,
        author: PersonnelId,
        published_at: DateTime<Utc>,
    ) -> PortalResult<NewsPost> {
        if title.trim().is_empty() || body.trim().is_empty() {
            return Err(PortalError::InvalidInput("seed post is blank".into()));
        }
        let post = NewsPost {
            id: PostId::generate(),
            title: title.to_string(),
            body: body.to_string(),
            image,
            author,
            published_at,
            reacted: HashSet::new(),
        };
        self.feed.write().push_front(post.clone());
        Ok(post)
    }
}

impl Default for NewsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn moderator() -> Session {
        Session {
            id: PersonnelId::generate(),
            role: Role::Moderator,
        }
    }

    fn member() -> Session {
        Session {
            id: PersonnelId::generate(),
            role: Role::User,
        }
    }

    #[test]
    fn publish_requires_editor_and_nonblank_fields() {
        let manager = NewsManager::new();
        let user = member();

        assert_eq!(
            manager.publish(Some(&user), "Orders", "Report in.", None).unwrap_err(),
            PortalError::Unauthorized
        );
        assert_eq!(
            manager.publish(None, "Orders", "Report in.", None).unwrap_err(),
            PortalError::Unauthorized
        );

        let staff = moderator();
        assert_eq!(
            manager.publish(Some(&staff), "  ", "Report in.", None).unwrap_err(),
            PortalError::InvalidInput("title is empty".into())
        );
        assert_eq!(
            manager.publish(Some(&staff), "Orders", "", None).unwrap_err(),
            PortalError::InvalidInput("body is empty".into())
        );
    }

    #[test]
    fn feed_is_most_recent_first() {
        let manager = NewsManager::new();
        let staff = moderator();
        manager.publish(Some(&staff), "First", "one", None).unwrap();
        manager.publish(Some(&staff), "Second", "two", None).unwrap();

        let feed = manager.feed();
        assert_eq!(feed[0].title, "Second");
        assert_eq!(feed[1].title, "First");
        assert_eq!(feed[0].author, staff.id);
    }

    #[test]
    fn toggle_reaction_is_a_strict_toggle() {
        let manager = NewsManager::new();
        let staff = moderator();
        let reader = member();
        let post = manager.publish(Some(&staff), "Orders", "Report in.", None).unwrap();

        assert_eq!(manager.toggle_reaction(Some(&reader), post.id).unwrap(), 1);
        assert!(manager.get(post.id).unwrap().reacted_by(reader.id));

        // Second call by the same identity un-reacts.
        assert_eq!(manager.toggle_reaction(Some(&reader), post.id).unwrap(), 0);
        assert!(!manager.get(post.id).unwrap().reacted_by(reader.id));
    }

    #[test]
    fn distinct_identities_react_independently() {
        let manager = NewsManager::new();
        let staff = moderator();
        let post = manager.publish(Some(&staff), "Orders", "Report in.", None).unwrap();

        let a = member();
        let b = member();
        assert_eq!(manager.toggle_reaction(Some(&a), post.id).unwrap(), 1);
        assert_eq!(manager.toggle_reaction(Some(&b), post.id).unwrap(), 2);
        assert_eq!(manager.toggle_reaction(Some(&a), post.id).unwrap(), 1);

        let post = manager.get(post.id).unwrap();
        assert_eq!(post.reactions(), 1);
        assert!(post.reacted_by(b.id));
    }

    #[test]
    fn guests_cannot_react() {
        let manager = NewsManager::new();
        let staff = moderator();
        let post = manager.publish(Some(&staff), "Orders", "Report in.", None).unwrap();

        assert_eq!(
            manager.toggle_reaction(None, post.id).unwrap_err(),
            PortalError::Unauthorized
        );
    }

    #[test]
    fn body_markup_round_trips_unchanged() {
        let manager = NewsManager::new();
        let staff = moderator();
        let body = "# Orders\n**Report** to __formation__ at *20:00*.";
        let post = manager.publish(Some(&staff), "Orders", body, None).unwrap();
        assert_eq!(manager.get(post.id).unwrap().body, body);
    }

    #[test]
    fn edit_validates_and_applies_partial_changes() {
        let manager = NewsManager::new();
        let staff = moderator();
        let post = manager.publish(Some(&staff), "Orders", "Report in.", None).unwrap();

        let err = manager
            .edit(
                Some(&staff),
                post.id,
                PostChange {
                    title: Some("   ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, PortalError::InvalidInput("title is empty".into()));

        let updated = manager
            .edit(
                Some(&staff),
                post.id,
                PostChange {
                    body: Some("Stand down.".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Orders");
        assert_eq!(updated.body, "Stand down.");
    }

    #[test]
    fn edit_replaces_or_removes_the_image() {
        let manager = NewsManager::new();
        let staff = moderator();
        let post = manager
            .publish(Some(&staff), "Orders", "Report in.", Some("old.png".into()))
            .unwrap();

        let updated = manager
            .edit(
                Some(&staff),
                post.id,
                PostChange {
                    image: Some(Some("new.png".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.image.as_deref(), Some("new.png"));

        let updated = manager
            .edit(
                Some(&staff),
                post.id,
                PostChange {
                    image: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.image.is_none());

        // An absent image field leaves the current value alone.
        let updated = manager
            .edit(
                Some(&staff),
                post.id,
                PostChange {
                    title: Some("New orders".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.image.is_none());
    }

    #[test]
    fn delete_removes_the_post() {
        let manager = NewsManager::new();
        let staff = moderator();
        let post = manager.publish(Some(&staff), "Orders", "Report in.", None).unwrap();

        manager.delete(Some(&staff), post.id).unwrap();
        assert!(manager.get(post.id).is_none());
        assert_eq!(
            manager.delete(Some(&staff), post.id).unwrap_err(),
            PortalError::NotFound(format!("post {}", post.id))
        );
    }
}
