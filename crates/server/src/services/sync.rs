//! User reconciliation service.
//!
//! Pulls the identity provider's user list, normalizes each entry into the
//! canonical profile, and upserts it into local storage. This is the single
//! shared implementation behind all three entry points (the admin sync
//! endpoint, the quick-sync endpoint, and the CLI command); the entry points
//! are thin authorization adapters and must stay that way.
//!
//! The run is best-effort, not atomic: a user without a resolvable primary
//! email is skipped without a write, and a storage failure for one user is
//! recorded and does not abort the rest of the batch. Re-running against
//! unchanged provider data is idempotent (the writes are upserts).

use serde::Serialize;
use tracing::{info, warn};

use crate::clerk::client::{ClerkError, IdentityProvider, LIST_USERS_PAGE_LIMIT};
use crate::db::RepositoryError;
use crate::models::user::UserProfile;

/// Storage capability the sync service writes through.
pub trait UserStore: Send + Sync {
    /// Create or update a user from a reconciled profile.
    fn upsert_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Outcome of one reconciliation run.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Users upserted.
    pub synced: u32,
    /// Users skipped for lack of a resolvable primary email.
    pub skipped: u32,
    /// Per-user storage failures (the rest of the batch still ran).
    pub errors: Vec<SyncFailure>,
}

impl SyncReport {
    /// Total provider users examined.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.synced + self.skipped
    }
}

/// One user that failed to persist.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub user_id: String,
    pub error: String,
}

/// The shared reconciliation service.
pub struct UserSyncService<P, S> {
    provider: P,
    store: S,
}

impl<P: IdentityProvider, S: UserStore> UserSyncService<P, S> {
    /// Create a sync service over a provider and a store.
    pub const fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    /// Run one reconciliation pass.
    ///
    /// Fetches a single page of up to [`LIST_USERS_PAGE_LIMIT`] users - the
    /// one-page cap is a known limitation carried over deliberately, not a
    /// bug to fix silently.
    ///
    /// # Errors
    ///
    /// Returns `ClerkError` only when the provider listing itself fails;
    /// per-user storage failures land in the report instead.
    pub async fn reconcile(&self) -> Result<SyncReport, ClerkError> {
        let users = self.provider.list_users(LIST_USERS_PAGE_LIMIT).await?;

        let mut report = SyncReport::default();

        for user in &users {
            let Some(profile) = user.to_profile() else {
                warn!(user_id = %user.id, "no primary email, skipping user");
                report.skipped += 1;
                continue;
            };

            match self.store.upsert_profile(&profile).await {
                Ok(()) => report.synced += 1,
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "failed to sync user");
                    report.errors.push(SyncFailure {
                        user_id: user.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            synced = report.synced,
            skipped = report.skipped,
            errors = report.errors.len(),
            "user sync complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::clerk::types::{ClerkEmailAddress, ClerkUser};

    struct StaticProvider {
        users: Vec<ClerkUser>,
    }

    impl IdentityProvider for StaticProvider {
        async fn list_users(&self, _limit: u32) -> Result<Vec<ClerkUser>, ClerkError> {
            Ok(self.users.clone())
        }

        async fn get_user(&self, id: &str) -> Result<ClerkUser, ClerkError> {
            self.users
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(ClerkError::Api {
                    status: 404,
                    message: "not found".to_owned(),
                })
        }
    }

    /// In-memory store; a handle can be kept to inspect writes afterwards.
    #[derive(Clone, Default)]
    struct MemoryStore {
        users: Arc<Mutex<HashMap<String, UserProfile>>>,
        fail_ids: Arc<Vec<String>>,
    }

    impl UserStore for MemoryStore {
        async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
            if self.fail_ids.iter().any(|id| id == profile.id.as_str()) {
                return Err(RepositoryError::DataCorruption("simulated failure".to_owned()));
            }
            self.users
                .lock()
                .expect("lock poisoned")
                .insert(profile.id.as_str().to_owned(), profile.clone());
            Ok(())
        }
    }

    fn provider_user(id: &str, email: Option<&str>) -> ClerkUser {
        ClerkUser {
            id: id.to_owned(),
            first_name: Some("Test".to_owned()),
            last_name: Some("Person".to_owned()),
            image_url: None,
            primary_email_address_id: email.map(|_| "idn_p".to_owned()),
            email_addresses: email
                .map(|e| {
                    vec![ClerkEmailAddress {
                        id: "idn_p".to_owned(),
                        email_address: e.to_owned(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_reconcile_syncs_resolvable_users_and_skips_rest() {
        let provider = StaticProvider {
            users: vec![
                provider_user("user_1", Some("one@example.com")),
                provider_user("user_2", None),
                provider_user("user_3", Some("three@example.com")),
            ],
        };
        let store = MemoryStore::default();
        let service = UserSyncService::new(provider, store.clone());

        let report = service.reconcile().await.expect("reconcile");

        assert_eq!(report.synced, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total(), 3);
        assert!(report.errors.is_empty());

        let written = store.users.lock().expect("lock poisoned");
        assert_eq!(written.len(), 2);
        assert!(written.contains_key("user_1"));
        assert!(!written.contains_key("user_2"));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let provider = StaticProvider {
            users: vec![provider_user("user_1", Some("one@example.com"))],
        };
        let store = MemoryStore::default();
        let service = UserSyncService::new(provider, store.clone());

        service.reconcile().await.expect("first run");
        let first: Vec<_> = {
            let users = store.users.lock().expect("lock poisoned");
            users.values().cloned().collect()
        };

        let report = service.reconcile().await.expect("second run");

        assert_eq!(report.synced, 1);
        let users = store.users.lock().expect("lock poisoned");
        assert_eq!(users.len(), 1);
        let second: Vec<_> = users.values().cloned().collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reconcile_isolates_per_user_failures() {
        let provider = StaticProvider {
            users: vec![
                provider_user("user_1", Some("one@example.com")),
                provider_user("user_2", Some("two@example.com")),
                provider_user("user_3", Some("three@example.com")),
            ],
        };
        let store = MemoryStore {
            fail_ids: Arc::new(vec!["user_2".to_owned()]),
            ..MemoryStore::default()
        };
        let service = UserSyncService::new(provider, store.clone());

        let report = service.reconcile().await.expect("reconcile");

        // One failure recorded, the remaining users still synced
        assert_eq!(report.synced, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors.first().map(|f| f.user_id.as_str()),
            Some("user_2")
        );
        assert_eq!(store.users.lock().expect("lock poisoned").len(), 2);
    }
}
