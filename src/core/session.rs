//! Guest session identity.
//!
//! Anonymous visitors are identified by two cookie-borne UUIDs: one for the
//! cart and one for favorites. Nothing here touches global state; the caller
//! parses the request's `Cookie` header into a [`SessionContext`] and passes
//! it to the operations that need it.

use uuid::Uuid;

/// Cookie holding the guest cart session id.
pub const CART_SESSION_COOKIE: &str = "sessionCartId";
/// Cookie holding the guest favorites session id.
pub const FAVORITE_SESSION_COOKIE: &str = "sessionFavoriteId";
/// Default cookie lifetime.
pub const DEFAULT_SESSION_MAX_AGE_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Who a cart or a favorites list belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// A signed-in user, by user id
    User(String),
    /// An anonymous visitor, by session id
    Guest(String),
}

/// The session identifiers carried by one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Value of the `sessionCartId` cookie, if present and well-formed
    pub cart_session_id: Option<String>,
    /// Value of the `sessionFavoriteId` cookie, if present and well-formed
    pub favorite_session_id: Option<String>,
}

impl SessionContext {
    /// Builds a context from a raw `Cookie` request header.
    ///
    /// Unknown cookies are ignored, as are session cookies whose value is not
    /// a UUID.
    #[must_use]
    pub fn from_cookie_header(header: &str) -> Self {
        let mut context = Self::default();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"');
            let slot = match name.trim() {
                CART_SESSION_COOKIE => &mut context.cart_session_id,
                FAVORITE_SESSION_COOKIE => &mut context.favorite_session_id,
                _ => continue,
            };
            match Uuid::parse_str(value) {
                Ok(id) => *slot = Some(id.to_string()),
                Err(_) => tracing::debug!("Ignoring malformed {} cookie", name.trim()),
            }
        }
        context
    }

    /// Returns the cart session id, issuing a fresh one if the request had none.
    ///
    /// The boolean is true when a new id was issued and the caller must send
    /// a `Set-Cookie` for it.
    pub fn ensure_cart_session(&mut self) -> (&str, bool) {
        ensure_id(&mut self.cart_session_id)
    }

    /// Returns the favorites session id, issuing a fresh one if the request had none.
    pub fn ensure_favorite_session(&mut self) -> (&str, bool) {
        ensure_id(&mut self.favorite_session_id)
    }

    /// Resolves who owns the cart for this request.
    ///
    /// A signed-in user always wins over the guest session.
    #[must_use]
    pub fn cart_owner(&self, user_id: Option<&str>) -> Option<Owner> {
        owner_for(user_id, self.cart_session_id.as_deref())
    }

    /// Resolves who owns the favorites list for this request.
    #[must_use]
    pub fn favorites_owner(&self, user_id: Option<&str>) -> Option<Owner> {
        owner_for(user_id, self.favorite_session_id.as_deref())
    }
}

fn ensure_id(slot: &mut Option<String>) -> (&str, bool) {
    let issued = slot.is_none();
    let id = slot.get_or_insert_with(new_session_id);
    (id.as_str(), issued)
}

fn owner_for(user_id: Option<&str>, session_id: Option<&str>) -> Option<Owner> {
    match (user_id, session_id) {
        (Some(user), _) => Some(Owner::User(user.to_string())),
        (None, Some(session)) => Some(Owner::Guest(session.to_string())),
        (None, None) => None,
    }
}

/// Generates a new random session id.
#[must_use]
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Renders a `Set-Cookie` header value for a session cookie.
#[must_use]
pub fn session_cookie(name: &str, value: &str, max_age_days: i64) -> String {
    format!(
        "{name}={value}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        max_age_days * SECONDS_PER_DAY
    )
}
