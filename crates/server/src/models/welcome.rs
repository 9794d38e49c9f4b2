//! Welcome-offer settings.
//!
//! A singleton configuration record (fixed id `"default"`). Reads lazily
//! create the defaults; writes replace all four fields together, never
//! partially.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Default coupon code seeded on first read.
pub const DEFAULT_COUPON_CODE: &str = "WELCOME15";
/// Default discount percentage.
pub const DEFAULT_DISCOUNT_PERCENTAGE: i32 = 15;
/// Default modal cooldown in hours.
pub const DEFAULT_COOLDOWN_HOURS: i32 = 6;
/// Largest accepted cooldown (one week).
pub const MAX_COOLDOWN_HOURS: i32 = 168;

/// The welcome modal's stored configuration.
///
/// Invariant: once any write has occurred, all four fields are present and
/// within their domains (`discount_percentage` in 1..=100, `cooldown_hours`
/// in 1..=168, `coupon_code` non-empty upper-case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeSettings {
    pub coupon_code: String,
    pub discount_percentage: i32,
    pub enabled: bool,
    pub cooldown_hours: i32,
}

impl Default for WelcomeSettings {
    fn default() -> Self {
        Self {
            coupon_code: DEFAULT_COUPON_CODE.to_owned(),
            discount_percentage: DEFAULT_DISCOUNT_PERCENTAGE,
            enabled: true,
            cooldown_hours: DEFAULT_COOLDOWN_HOURS,
        }
    }
}

impl WelcomeSettings {
    /// Cooldown converted to milliseconds for timestamp comparisons.
    #[must_use]
    pub fn cooldown_millis(&self) -> i64 {
        i64::from(self.cooldown_hours) * 60 * 60 * 1000
    }
}

/// Why a settings candidate was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsValidationError {
    #[error("coupon code cannot be empty")]
    EmptyCouponCode,
    #[error("discount percentage must be between 1 and 100 (got {0})")]
    DiscountOutOfRange(i32),
}

/// An incoming settings candidate from the admin dashboard.
///
/// The whole candidate is rejected on any single-field violation; nothing is
/// stored partially. `cooldown_hours` outside 1..=168 (or absent) falls back
/// to the default rather than failing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeSettingsUpdate {
    pub coupon_code: String,
    pub discount_percentage: i32,
    pub enabled: bool,
    #[serde(default)]
    pub cooldown_hours: Option<i32>,
}

impl WelcomeSettingsUpdate {
    /// Validate and normalize into storable settings.
    ///
    /// Normalization: the coupon code is trimmed and upper-cased, and the
    /// cooldown defaults to [`DEFAULT_COOLDOWN_HOURS`] when absent or out of
    /// domain.
    ///
    /// # Errors
    ///
    /// Returns `SettingsValidationError` if the coupon code is empty after
    /// trimming or the discount percentage is outside 1..=100.
    pub fn validate(self) -> Result<WelcomeSettings, SettingsValidationError> {
        let coupon_code = self.coupon_code.trim().to_uppercase();
        if coupon_code.is_empty() {
            return Err(SettingsValidationError::EmptyCouponCode);
        }

        if !(1..=100).contains(&self.discount_percentage) {
            return Err(SettingsValidationError::DiscountOutOfRange(
                self.discount_percentage,
            ));
        }

        let cooldown_hours = match self.cooldown_hours {
            Some(h) if (1..=MAX_COOLDOWN_HOURS).contains(&h) => h,
            _ => DEFAULT_COOLDOWN_HOURS,
        };

        Ok(WelcomeSettings {
            coupon_code,
            discount_percentage: self.discount_percentage,
            enabled: self.enabled,
            cooldown_hours,
        })
    }
}
