//! Welcome modal eligibility flow.
//!
//! Decides whether the promotional modal should be presented, based on the
//! stored settings, a per-visitor cooldown timestamp, and (for signed-in
//! callers) their order count. The flow is a small state machine over
//! injected [`Clock`] and [`LastShownStore`] capabilities so the transition
//! rules are deterministic under test.

pub mod eligibility;
pub mod session_store;

pub use eligibility::{
    Audience, Clock, EligibilityState, LastShownStore, Outcome, Precheck, SystemClock, Visitor,
    WelcomeFlow,
};
pub use session_store::SessionLastShown;
