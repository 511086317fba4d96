//! Database row types. These map directly to Postgres rows and are kept
//! distinct from the `fete-types` models so the wire format can evolve
//! independently of the schema.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use sqlx::types::Json;

use fete_types::models::{
    Admin, Celebration, CelebrationRef, Sections, Theme, Wish, WishWithCelebration,
};

use crate::store::AdminCredentials;

#[derive(Debug, FromRow)]
pub struct AdminRow {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

impl From<AdminRow> for AdminCredentials {
    fn from(row: AdminRow) -> Self {
        AdminCredentials {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct CelebrationRow {
    pub id: i32,
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
    pub theme: Json<Theme>,
    pub sections: Json<Sections>,
    pub quotes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CelebrationRow> for Celebration {
    fn from(row: CelebrationRow) -> Self {
        Celebration {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            slug: row.slug,
            event_type: row.event_type,
            event_date: row.event_date,
            story: row.story,
            cover_image: row.cover_image,
            images: row.images,
            videos: row.videos,
            qr_image: row.qr_image,
            spotify_code: row.spotify_code,
            money_collection_enabled: row.money_collection_enabled,
            theme: row.theme.0,
            sections: row.sections.0,
            quotes: row.quotes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct WishRow {
    pub id: i32,
    pub celebration_id: i32,
    pub name: String,
    pub message: String,
    pub amount: Option<Decimal>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WishRow> for Wish {
    fn from(row: WishRow) -> Self {
        Wish {
            id: row.id,
            celebration_id: row.celebration_id,
            name: row.name,
            message: row.message,
            amount: row.amount,
            approved: row.approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `wishes LEFT JOIN celebrations`.
#[derive(Debug, FromRow)]
pub struct WishListRow {
    #[sqlx(flatten)]
    pub wish: WishRow,
    pub celebration_title: Option<String>,
    pub celebration_slug: Option<String>,
}

impl From<WishListRow> for WishWithCelebration {
    fn from(row: WishListRow) -> Self {
        let celebration = match (row.celebration_title, row.celebration_slug) {
            (Some(title), Some(slug)) => Some(CelebrationRef { title, slug }),
            _ => None,
        };
        WishWithCelebration {
            wish: row.wish.into(),
            celebration,
        }
    }
}
