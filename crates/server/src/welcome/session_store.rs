//! Session-backed last-shown storage.
//!
//! The server-side counterpart of the original per-browser storage: the
//! cooldown timestamp lives in the caller's session. Storage failures are
//! logged and absorbed - a lost timestamp only means the modal may show
//! again early, which is never worth failing a page for.

use tower_sessions::Session;
use tracing::warn;

use crate::models::session::session_keys;

use super::eligibility::LastShownStore;

/// [`LastShownStore`] over the caller's session.
#[derive(Clone)]
pub struct SessionLastShown {
    session: Session,
}

impl SessionLastShown {
    /// Wrap a request session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LastShownStore for SessionLastShown {
    async fn get(&self) -> Option<i64> {
        self.session
            .get::<i64>(session_keys::WELCOME_LAST_SHOWN)
            .await
            .ok()
            .flatten()
    }

    async fn set(&self, timestamp_millis: i64) {
        if let Err(e) = self
            .session
            .insert(session_keys::WELCOME_LAST_SHOWN, timestamp_millis)
            .await
        {
            warn!(error = %e, "failed to record welcome modal timestamp");
        }
    }

    async fn clear(&self) {
        if let Err(e) = self
            .session
            .remove::<i64>(session_keys::WELCOME_LAST_SHOWN)
            .await
        {
            warn!(error = %e, "failed to clear welcome modal timestamp");
        }
    }
}
