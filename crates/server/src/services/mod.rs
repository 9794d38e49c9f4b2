//! Service layer - external API clients and shared business logic.

pub mod imagekit;
pub mod sync;

pub use imagekit::{ImageKitClient, ImageKitError};
pub use sync::{SyncFailure, SyncReport, UserStore, UserSyncService};
