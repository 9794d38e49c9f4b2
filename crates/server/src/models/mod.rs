//! Domain models.
//!
//! These types represent validated domain objects separate from the wire and
//! row representations used at the edges. Most of them double as JSON
//! response bodies (camelCase), matching the shapes the seller dashboard
//! consumes.

pub mod order;
pub mod review;
pub mod session;
pub mod user;
pub mod welcome;

pub use order::{Order, OrderAddress, OrderItem, OrderProduct};
pub use review::{NewReview, ProductReviews, Review, ReviewAuthor};
pub use session::{CurrentUser, Role, session_keys};
pub use user::{UserProfile, UserRecord};
pub use welcome::{WelcomeSettings, WelcomeSettingsUpdate};
