//! Cache tags for rendered storefront content.
//!
//! After a cart or favorites mutation the page layer must drop cached output
//! that depends on the affected user or session. [`cache_tags`] maps the
//! identifiers of a request to the set of tags to revalidate; [`invalidate`]
//! pushes them to a [`CacheInvalidator`].

use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::debug;

/// Tag covering all session-scoped content (cart badge, favorites list, ...).
pub const GLOBAL_TAG: &str = "session-data";

/// Identifiers whose cached content must be refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheScope<'a> {
    /// Signed-in user, if any
    pub user_id: Option<&'a str>,
    /// Guest cart session, if any
    pub cart_session_id: Option<&'a str>,
    /// Guest favorites session, if any
    pub favorite_session_id: Option<&'a str>,
}

/// Returns the tags to revalidate for `scope`.
///
/// Always contains [`GLOBAL_TAG`]. Adds `user:{id}` for a user,
/// `cart-session:{id}` and `favorite-session:{id}` for the guest sessions,
/// and `sessions:{cart}:{favorites}` when both sessions are present and
/// differ. The result is ordered, so equal scopes yield equal sets.
#[must_use]
pub fn cache_tags(scope: &CacheScope<'_>) -> BTreeSet<String> {
    let mut tags = BTreeSet::from([GLOBAL_TAG.to_string()]);

    if let Some(user_id) = scope.user_id {
        tags.insert(format!("user:{user_id}"));
    }
    if let Some(cart) = scope.cart_session_id {
        tags.insert(format!("cart-session:{cart}"));
    }
    if let Some(favorites) = scope.favorite_session_id {
        tags.insert(format!("favorite-session:{favorites}"));
    }
    if let (Some(cart), Some(favorites)) = (scope.cart_session_id, scope.favorite_session_id) {
        if cart != favorites {
            tags.insert(format!("sessions:{cart}:{favorites}"));
        }
    }

    tags
}

/// Sink for cache invalidation signals.
pub trait CacheInvalidator: Send + Sync {
    /// Marks everything cached under `tag` as stale.
    fn revalidate_tag(&self, tag: &str);
}

/// Invalidator that remembers every tag it was given.
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    tags: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    /// Tags received so far, in call order.
    #[must_use]
    pub fn recorded(&self) -> Vec<String> {
        self.tags
            .lock()
            .map(|tags| tags.clone())
            .unwrap_or_default()
    }
}

impl CacheInvalidator for RecordingInvalidator {
    fn revalidate_tag(&self, tag: &str) {
        if let Ok(mut tags) = self.tags.lock() {
            tags.push(tag.to_string());
        }
    }
}

/// Sends every tag for `scope` to `invalidator` and returns the set sent.
pub fn invalidate(invalidator: &dyn CacheInvalidator, scope: &CacheScope<'_>) -> BTreeSet<String> {
    let tags = cache_tags(scope);
    debug!("Revalidating cache tags {:?}", tags);
    for tag in &tags {
        invalidator.revalidate_tag(tag);
    }
    tags
}
