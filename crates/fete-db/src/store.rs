use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use fete_types::models::{Admin, Celebration, Sections, Theme, Wish, WishWithCelebration};

use crate::error::DbError;

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Admin row including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
}

/// A validated celebration ready to insert.
#[derive(Debug, Clone)]
pub struct NewCelebration {
    pub title: String,
    pub subtitle: Option<String>,
    pub slug: String,
    pub event_type: String,
    pub event_date: Option<NaiveDate>,
    pub story: Option<String>,
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub qr_image: Option<String>,
    pub spotify_code: Option<String>,
    pub money_collection_enabled: bool,
    pub theme: Theme,
    pub sections: Sections,
    pub quotes: Vec<String>,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CelebrationChanges {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub slug: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub story: Option<String>,
    pub cover_image: Option<String>,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
    pub qr_image: Option<String>,
    pub spotify_code: Option<String>,
    pub money_collection_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub sections: Option<Sections>,
    pub quotes: Option<Vec<String>>,
}

/// Magnitude `wishes.amount` (NUMERIC(10, 2)) can no longer hold.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    Negative,
    TooLarge,
    TooPrecise,
}

/// Rejects contributions the `wishes.amount` column would overflow on or
/// silently round.
pub fn check_amount(amount: Decimal) -> Result<(), AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(AmountError::Negative)
    } else if amount.normalize().scale() > AMOUNT_SCALE {
        Err(AmountError::TooPrecise)
    } else if amount.abs() >= AMOUNT_LIMIT {
        Err(AmountError::TooLarge)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewWish {
    pub celebration_id: i32,
    pub name: String,
    pub message: String,
    pub amount: Option<Decimal>,
}

/// Everything the HTTP layer needs from persistence.
///
/// Implemented by [`crate::Database`] for Postgres and, behind the `fake`
/// feature, by an in-memory store for tests.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Admins --

    async fn admin_credentials(&self, email: &str) -> DbResult<Option<AdminCredentials>>;

    async fn admin_by_id(&self, id: i32) -> DbResult<Option<Admin>>;

    // -- Celebrations --

    /// Newest first.
    async fn list_celebrations(&self) -> DbResult<Vec<Celebration>>;

    async fn celebration_by_id(&self, id: i32) -> DbResult<Option<Celebration>>;

    async fn celebration_by_slug(&self, slug: &str) -> DbResult<Option<Celebration>>;

    async fn celebration_exists(&self, id: i32) -> DbResult<bool>;

    /// Whether a celebration other than `excluding` already uses `slug`.
    async fn slug_taken(&self, slug: &str, excluding: Option<i32>) -> DbResult<bool>;

    async fn insert_celebration(&self, new: &NewCelebration) -> DbResult<Celebration>;

    /// Returns `None` when no celebration has that id.
    async fn update_celebration(
        &self,
        id: i32,
        changes: &CelebrationChanges,
    ) -> DbResult<Option<Celebration>>;

    /// Deletes the row and, through the foreign key, its wishes.
    /// Returns false when nothing was deleted.
    async fn delete_celebration(&self, id: i32) -> DbResult<bool>;

    // -- Wishes --

    /// All wishes, newest first, with the page each belongs to.
    async fn list_wishes(&self) -> DbResult<Vec<WishWithCelebration>>;

    /// Approved wishes for one page, newest first.
    async fn approved_wishes(&self, celebration_id: i32) -> DbResult<Vec<Wish>>;

    /// Inserted unapproved.
    async fn insert_wish(&self, new: &NewWish) -> DbResult<Wish>;

    async fn approve_wish(&self, id: i32) -> DbResult<Option<Wish>>;

    async fn delete_wish(&self, id: i32) -> DbResult<bool>;
}
