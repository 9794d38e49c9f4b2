//! Eligibility state machine for the welcome modal.
//!
//! States: `Unevaluated`, `Suppressed`, `EligibleFirstOrder`,
//! `EligibleGuest`, `Shown`, `Dismissed`. Evaluated once per page load, in
//! two phases so the order-count lookup only happens when the outcome is
//! still undecided:
//!
//! 1. [`WelcomeFlow::precheck`] - disabled settings or an active cooldown
//!    suppress the modal outright.
//! 2. [`WelcomeFlow::resolve`] - a signed-in caller with zero orders (or any
//!    guest) becomes eligible, the last-shown timestamp is recorded, and the
//!    flow lands in `Shown`. A signed-in repeat customer is suppressed even
//!    though the cooldown has elapsed - the first-order incentive must not
//!    reach them.
//!
//! Closing the modal moves `Shown` to `Dismissed` without touching the
//! timestamp again.

use crate::models::welcome::WelcomeSettings;

/// Time source capability.
pub trait Clock {
    /// Current time in milliseconds since the unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Persistent storage capability for the last-shown timestamp.
///
/// In production this is the caller's session; tests use an in-memory store.
/// Storage failures are absorbed by implementations (a lost timestamp only
/// means the modal may show again early).
pub trait LastShownStore: Send {
    /// Last-shown timestamp in milliseconds, if any.
    fn get(&self) -> impl Future<Output = Option<i64>> + Send;

    /// Record a new last-shown timestamp.
    fn set(&self, timestamp_millis: i64) -> impl Future<Output = ()> + Send;

    /// Forget the stored timestamp.
    fn clear(&self) -> impl Future<Output = ()> + Send;
}

/// The flow's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityState {
    /// Nothing decided yet.
    Unevaluated,
    /// Terminal: the modal must not be presented.
    Suppressed,
    /// Signed-in caller with no prior orders; about to be shown.
    EligibleFirstOrder,
    /// Guest caller; about to be shown.
    EligibleGuest,
    /// The modal is on screen and the timestamp was recorded.
    Shown,
    /// Terminal: the caller closed the modal.
    Dismissed,
}

/// Who is looking at the page.
#[derive(Debug, Clone, Copy)]
pub enum Visitor {
    /// Not signed in.
    Guest,
    /// Signed in, with their current order count.
    SignedIn {
        /// Number of orders the caller has placed.
        order_count: i64,
    },
}

/// Result of the first evaluation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precheck {
    /// Terminal - settings or cooldown ruled the modal out.
    Suppressed,
    /// Undecided - the caller's visitor context is needed.
    NeedsVisitor,
}

/// Which variant of the modal was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Signed-in caller on their first order.
    FirstOrder,
    /// Guest.
    Guest,
}

/// Final evaluation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The modal is not presented.
    Suppressed,
    /// The modal is presented to the given audience.
    Shown(Audience),
}

/// The welcome modal eligibility flow.
pub struct WelcomeFlow<C, S> {
    clock: C,
    store: S,
    state: EligibilityState,
}

impl<C: Clock, S: LastShownStore> WelcomeFlow<C, S> {
    /// Create a fresh, unevaluated flow.
    pub const fn new(clock: C, store: S) -> Self {
        Self {
            clock,
            store,
            state: EligibilityState::Unevaluated,
        }
    }

    /// Current state.
    pub const fn state(&self) -> EligibilityState {
        self.state
    }

    /// Phase one: apply the settings and cooldown rules.
    ///
    /// Suppresses when the modal is disabled, or when the stored last-shown
    /// timestamp is younger than the configured cooldown. Otherwise the flow
    /// stays `Unevaluated` and [`Self::resolve`] must be called with the
    /// visitor context.
    pub async fn precheck(&mut self, settings: &WelcomeSettings) -> Precheck {
        if !settings.enabled {
            self.state = EligibilityState::Suppressed;
            return Precheck::Suppressed;
        }

        if let Some(last_shown) = self.store.get().await {
            let elapsed = self.clock.now_millis() - last_shown;
            if elapsed < settings.cooldown_millis() {
                self.state = EligibilityState::Suppressed;
                return Precheck::Suppressed;
            }
        }

        Precheck::NeedsVisitor
    }

    /// Phase two: decide for the given visitor and record the show.
    ///
    /// Must follow a [`Precheck::NeedsVisitor`]; on any already-terminal
    /// state this is a no-op returning `Suppressed`.
    pub async fn resolve(&mut self, visitor: Visitor) -> Outcome {
        if self.state != EligibilityState::Unevaluated {
            return Outcome::Suppressed;
        }

        let audience = match visitor {
            Visitor::SignedIn { order_count: 0 } => {
                self.state = EligibilityState::EligibleFirstOrder;
                Audience::FirstOrder
            }
            Visitor::SignedIn { .. } => {
                // A repeat customer never sees the first-order incentive,
                // regardless of cooldown.
                self.state = EligibilityState::Suppressed;
                return Outcome::Suppressed;
            }
            Visitor::Guest => {
                self.state = EligibilityState::EligibleGuest;
                Audience::Guest
            }
        };

        self.store.set(self.clock.now_millis()).await;
        self.state = EligibilityState::Shown;

        Outcome::Shown(audience)
    }

    /// User-initiated close: `Shown` becomes `Dismissed`, terminal, with no
    /// further timestamp mutation.
    pub fn dismiss(&mut self) -> EligibilityState {
        self.state = EligibilityState::Dismissed;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        value: Mutex<Option<i64>>,
        writes: Mutex<u32>,
    }

    impl LastShownStore for MemoryStore {
        async fn get(&self) -> Option<i64> {
            *self.value.lock().expect("lock poisoned")
        }

        async fn set(&self, timestamp_millis: i64) {
            *self.value.lock().expect("lock poisoned") = Some(timestamp_millis);
            *self.writes.lock().expect("lock poisoned") += 1;
        }

        async fn clear(&self) {
            *self.value.lock().expect("lock poisoned") = None;
        }
    }

    impl LastShownStore for &MemoryStore {
        async fn get(&self) -> Option<i64> {
            *self.value.lock().expect("lock poisoned")
        }

        async fn set(&self, timestamp_millis: i64) {
            *self.value.lock().expect("lock poisoned") = Some(timestamp_millis);
            *self.writes.lock().expect("lock poisoned") += 1;
        }

        async fn clear(&self) {
            *self.value.lock().expect("lock poisoned") = None;
        }
    }

    const NOW: i64 = 1_700_000_000_000;
    const HOUR_MS: i64 = 3_600_000;

    fn settings(enabled: bool, cooldown_hours: i32) -> WelcomeSettings {
        WelcomeSettings {
            enabled,
            cooldown_hours,
            ..WelcomeSettings::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_settings_suppress() {
        let store = MemoryStore::default();
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        assert_eq!(flow.precheck(&settings(false, 6)).await, Precheck::Suppressed);
        assert_eq!(flow.state(), EligibilityState::Suppressed);
    }

    #[tokio::test]
    async fn test_signed_in_first_order_is_shown_and_recorded() {
        let store = MemoryStore::default();
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        assert_eq!(
            flow.precheck(&settings(true, 6)).await,
            Precheck::NeedsVisitor
        );
        let outcome = flow.resolve(Visitor::SignedIn { order_count: 0 }).await;

        assert_eq!(outcome, Outcome::Shown(Audience::FirstOrder));
        assert_eq!(flow.state(), EligibilityState::Shown);
        assert_eq!(store.get().await, Some(NOW));
    }

    #[tokio::test]
    async fn test_signed_in_repeat_customer_is_suppressed() {
        let store = MemoryStore::default();
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        flow.precheck(&settings(true, 6)).await;
        let outcome = flow.resolve(Visitor::SignedIn { order_count: 3 }).await;

        assert_eq!(outcome, Outcome::Suppressed);
        assert_eq!(flow.state(), EligibilityState::Suppressed);
        // No timestamp recorded for a suppressed modal
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn test_guest_within_cooldown_is_suppressed() {
        let store = MemoryStore::default();
        store.set(NOW - 1).await;
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        assert_eq!(flow.precheck(&settings(true, 6)).await, Precheck::Suppressed);
    }

    #[tokio::test]
    async fn test_guest_after_cooldown_is_shown() {
        let store = MemoryStore::default();
        store.set(NOW - 7 * HOUR_MS).await;
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        assert_eq!(
            flow.precheck(&settings(true, 6)).await,
            Precheck::NeedsVisitor
        );
        let outcome = flow.resolve(Visitor::Guest).await;

        assert_eq!(outcome, Outcome::Shown(Audience::Guest));
        assert_eq!(store.get().await, Some(NOW));
    }

    #[tokio::test]
    async fn test_cooldown_boundary_is_exclusive() {
        // Exactly cooldown_ms elapsed: no longer "< cooldown", so eligible
        let store = MemoryStore::default();
        store.set(NOW - 6 * HOUR_MS).await;
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        assert_eq!(
            flow.precheck(&settings(true, 6)).await,
            Precheck::NeedsVisitor
        );
    }

    #[tokio::test]
    async fn test_dismiss_is_terminal_without_timestamp_mutation() {
        let store = MemoryStore::default();
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        flow.precheck(&settings(true, 6)).await;
        flow.resolve(Visitor::Guest).await;
        assert_eq!(*store.writes.lock().expect("lock poisoned"), 1);

        assert_eq!(flow.dismiss(), EligibilityState::Dismissed);
        assert_eq!(*store.writes.lock().expect("lock poisoned"), 1);
    }

    #[tokio::test]
    async fn test_resolve_after_suppression_is_noop() {
        let store = MemoryStore::default();
        let mut flow = WelcomeFlow::new(FixedClock(NOW), &store);

        flow.precheck(&settings(false, 6)).await;
        let outcome = flow.resolve(Visitor::Guest).await;

        assert_eq!(outcome, Outcome::Suppressed);
        assert_eq!(store.get().await, None);
    }
}
