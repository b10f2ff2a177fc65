//! Sign-in hook.
//!
//! Called by the authentication layer once a visitor has signed in. Folds the
//! guest cart and guest favorites into the user's data and refreshes cached
//! pages. A failed merge is logged and never blocks the login itself.

use crate::core::{
    cache::{CacheInvalidator, CacheScope, invalidate},
    favorites::{FavoritesMergeOutcome, merge_favorites},
    merge::{CartMergeOutcome, merge_carts},
    session::SessionContext,
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;
use tracing::{error, info, instrument};

/// What happened during a sign-in merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInReport {
    /// Cart merge result; None when there was nothing to merge or it failed
    pub cart: Option<CartMergeOutcome>,
    /// Favorites merge result; None when there was nothing to merge or it failed
    pub favorites: Option<FavoritesMergeOutcome>,
    /// Number of merges that failed and were skipped
    pub failures: usize,
    /// Cache tags that were revalidated
    pub invalidated_tags: BTreeSet<String>,
}

/// Runs the guest-to-user merges for a freshly signed-in user.
///
/// The cart merge runs first, then the favorites merge; a failure in one does
/// not prevent the other. Cache tags for the user and both sessions are
/// revalidated at the end regardless of the outcome.
#[instrument(skip(db, session, invalidator))]
pub async fn handle_sign_in(
    db: &DatabaseConnection,
    user_id: &str,
    session: &SessionContext,
    invalidator: &dyn CacheInvalidator,
) -> SignInReport {
    let mut report = SignInReport::default();

    if let Some(cart_session_id) = session.cart_session_id.as_deref() {
        match merge_carts(db, user_id, cart_session_id).await {
            Ok(outcome) => report.cart = outcome,
            Err(e) => {
                error!("Failed to merge guest cart {}: {}", cart_session_id, e);
                report.failures += 1;
            }
        }
    }

    if let Some(favorite_session_id) = session.favorite_session_id.as_deref() {
        match merge_favorites(db, user_id, favorite_session_id).await {
            Ok(outcome) => report.favorites = outcome,
            Err(e) => {
                error!(
                    "Failed to merge guest favorites {}: {}",
                    favorite_session_id, e
                );
                report.failures += 1;
            }
        }
    }

    let scope = CacheScope {
        user_id: Some(user_id),
        cart_session_id: session.cart_session_id.as_deref(),
        favorite_session_id: session.favorite_session_id.as_deref(),
    };
    report.invalidated_tags = invalidate(invalidator, &scope);

    info!(
        "Sign-in merge finished: cart={:?} favorites={:?} failures={}",
        report.cart, report.favorites, report.failures
    );
    report
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::cache::RecordingInvalidator;
    use crate::core::cart::{add_to_cart, get_cart};
    use crate::core::favorites::{list_favorites, toggle_favorite};
    use crate::core::session::Owner;
    use crate::errors::Result;
    use crate::test_utils::*;

    const USER: &str = "user-42";
    const CART_SESSION: &str = "0b6f3c1e-5a51-4bb4-9a43-2f7f5d0f1a11";
    const FAV_SESSION: &str = "7d2d8b8e-64b5-4a0b-8d3e-6c1f0e2b9c22";

    fn session() -> SessionContext {
        SessionContext {
            cart_session_id: Some(CART_SESSION.to_string()),
            favorite_session_id: Some(FAV_SESSION.to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_in_merges_cart_and_favorites() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Gift Box", 2500, 3).await?;
        add_to_cart(&db, &Owner::Guest(CART_SESSION.to_string()), product.id, 1).await?;
        toggle_favorite(&db, &Owner::Guest(FAV_SESSION.to_string()), product.id).await?;

        let recorder = RecordingInvalidator::default();
        let report = handle_sign_in(&db, USER, &session(), &recorder).await;

        assert_eq!(report.failures, 0);
        assert_eq!(report.cart.unwrap().merged, 1);
        assert_eq!(report.favorites.unwrap().merged, 1);
        assert!(report.invalidated_tags.contains(&format!("user:{USER}")));
        assert_eq!(recorder.recorded().len(), report.invalidated_tags.len());

        let user = Owner::User(USER.to_string());
        assert_eq!(get_cart(&db, &user).await?.unwrap().item_count(), 1);
        assert_eq!(list_favorites(&db, &user).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_without_sessions_only_invalidates() -> Result<()> {
        let db = setup_test_db().await?;
        let recorder = RecordingInvalidator::default();

        let report = handle_sign_in(&db, USER, &SessionContext::default(), &recorder).await;
        assert_eq!(report.cart, None);
        assert_eq!(report.favorites, None);
        assert_eq!(report.failures, 0);
        assert!(!recorder.recorded().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_survives_storage_failure() -> Result<()> {
        // No tables: both merges fail, the login still completes
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        let recorder = RecordingInvalidator::default();

        let report = handle_sign_in(&db, USER, &session(), &recorder).await;
        assert_eq!(report.failures, 2);
        assert!(report.cart.is_none());
        assert!(!report.invalidated_tags.is_empty());

        Ok(())
    }
}
