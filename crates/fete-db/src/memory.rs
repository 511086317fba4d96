//! In-memory [`Store`] with the same constraints as the Postgres schema
//! (unique slug, wish foreign key with cascade). Used by handler tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::RoundingStrategy;
use tokio::sync::Mutex;

use fete_types::models::{Admin, Celebration, CelebrationRef, Wish, WishWithCelebration};

use crate::error::DbError;
use crate::store::{
    AMOUNT_LIMIT, AMOUNT_SCALE, AdminCredentials, CelebrationChanges, DbResult, NewCelebration,
    NewWish, Store,
};

#[derive(Default)]
struct Tables {
    admins: Vec<(Admin, String)>,
    celebrations: Vec<Celebration>,
    wishes: Vec<Wish>,
    next_celebration_id: i32,
    next_wish_id: i32,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_admin(&self, email: &str, password_hash: &str) -> Admin {
        let mut tables = self.tables.lock().await;
        let admin = Admin {
            id: tables.admins.len() as i32 + 1,
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables.admins.push((admin.clone(), password_hash.to_string()));
        admin
    }

    pub async fn remove_admin(&self, id: i32) {
        self.tables.lock().await.admins.retain(|(admin, _)| admin.id != id);
    }

    /// Every wish, approved or not, regardless of page.
    pub async fn all_wishes(&self) -> Vec<Wish> {
        self.tables.lock().await.wishes.clone()
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32)) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl Store for MemoryStore {
    async fn admin_credentials(&self, email: &str) -> DbResult<Option<AdminCredentials>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .admins
            .iter()
            .find(|(admin, _)| admin.email == email)
            .map(|(admin, hash)| AdminCredentials {
                id: admin.id,
                email: admin.email.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn admin_by_id(&self, id: i32) -> DbResult<Option<Admin>> {
        let tables = self.tables.lock().await;
        Ok(tables.admins.iter().find(|(admin, _)| admin.id == id).map(|(admin, _)| admin.clone()))
    }

    async fn list_celebrations(&self) -> DbResult<Vec<Celebration>> {
        let tables = self.tables.lock().await;
        Ok(newest_first(tables.celebrations.clone(), |c| (c.created_at, c.id)))
    }

    async fn celebration_by_id(&self, id: i32) -> DbResult<Option<Celebration>> {
        let tables = self.tables.lock().await;
        Ok(tables.celebrations.iter().find(|c| c.id == id).cloned())
    }

    async fn celebration_by_slug(&self, slug: &str) -> DbResult<Option<Celebration>> {
        let tables = self.tables.lock().await;
        Ok(tables.celebrations.iter().find(|c| c.slug == slug).cloned())
    }

    async fn celebration_exists(&self, id: i32) -> DbResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.celebrations.iter().any(|c| c.id == id))
    }

    async fn slug_taken(&self, slug: &str, excluding: Option<i32>) -> DbResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .celebrations
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != excluding))
    }

    async fn insert_celebration(&self, new: &NewCelebration) -> DbResult<Celebration> {
        let mut tables = self.tables.lock().await;
        if tables.celebrations.iter().any(|c| c.slug == new.slug) {
            return Err(DbError::UniqueViolation("celebrations_slug_key".into()));
        }

        tables.next_celebration_id += 1;
        let now = Utc::now();
        let celebration = Celebration {
            id: tables.next_celebration_id,
            title: new.title.clone(),
            subtitle: new.subtitle.clone(),
            slug: new.slug.clone(),
            event_type: new.event_type.clone(),
            event_date: new.event_date,
            story: new.story.clone(),
            cover_image: new.cover_image.clone(),
            images: new.images.clone(),
            videos: new.videos.clone(),
            qr_image: new.qr_image.clone(),
            spotify_code: new.spotify_code.clone(),
            money_collection_enabled: new.money_collection_enabled,
            theme: new.theme.clone(),
            sections: new.sections.clone(),
            quotes: new.quotes.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.celebrations.push(celebration.clone());
        Ok(celebration)
    }

    async fn update_celebration(
        &self,
        id: i32,
        changes: &CelebrationChanges,
    ) -> DbResult<Option<Celebration>> {
        let mut tables = self.tables.lock().await;
        if let Some(slug) = &changes.slug {
            if tables.celebrations.iter().any(|c| &c.slug == slug && c.id != id) {
                return Err(DbError::UniqueViolation("celebrations_slug_key".into()));
            }
        }

        let Some(c) = tables.celebrations.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        fn keep<T: Clone>(slot: &mut T, change: &Option<T>) {
            if let Some(value) = change {
                *slot = value.clone();
            }
        }
        fn keep_opt<T: Clone>(slot: &mut Option<T>, change: &Option<T>) {
            if let Some(value) = change {
                *slot = Some(value.clone());
            }
        }

        keep(&mut c.title, &changes.title);
        keep_opt(&mut c.subtitle, &changes.subtitle);
        keep(&mut c.slug, &changes.slug);
        keep(&mut c.event_type, &changes.event_type);
        keep_opt(&mut c.event_date, &changes.event_date);
        keep_opt(&mut c.story, &changes.story);
        keep_opt(&mut c.cover_image, &changes.cover_image);
        keep(&mut c.images, &changes.images);
        keep(&mut c.videos, &changes.videos);
        keep_opt(&mut c.qr_image, &changes.qr_image);
        keep_opt(&mut c.spotify_code, &changes.spotify_code);
        keep(&mut c.money_collection_enabled, &changes.money_collection_enabled);
        keep(&mut c.theme, &changes.theme);
        keep(&mut c.sections, &changes.sections);
        keep(&mut c.quotes, &changes.quotes);
        c.updated_at = Utc::now();

        Ok(Some(c.clone()))
    }

    async fn delete_celebration(&self, id: i32) -> DbResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.celebrations.len();
        tables.celebrations.retain(|c| c.id != id);
        let deleted = tables.celebrations.len() < before;
        if deleted {
            tables.wishes.retain(|w| w.celebration_id != id);
        }
        Ok(deleted)
    }

    async fn list_wishes(&self) -> DbResult<Vec<WishWithCelebration>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .wishes
            .iter()
            .map(|wish| WishWithCelebration {
                wish: wish.clone(),
                celebration: tables
                    .celebrations
                    .iter()
                    .find(|c| c.id == wish.celebration_id)
                    .map(|c| CelebrationRef {
                        title: c.title.clone(),
                        slug: c.slug.clone(),
                    }),
            })
            .collect();
        Ok(newest_first(rows, |w| (w.wish.created_at, w.wish.id)))
    }

    async fn approved_wishes(&self, celebration_id: i32) -> DbResult<Vec<Wish>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .wishes
            .iter()
            .filter(|w| w.celebration_id == celebration_id && w.approved)
            .cloned()
            .collect();
        Ok(newest_first(rows, |w| (w.created_at, w.id)))
    }

    async fn insert_wish(&self, new: &NewWish) -> DbResult<Wish> {
        let mut tables = self.tables.lock().await;
        if !tables.celebrations.iter().any(|c| c.id == new.celebration_id) {
            return Err(DbError::MissingReference);
        }

        // NUMERIC(10, 2): round to cents, then overflow.
        let amount = new.amount.map(|a| {
            a.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
        });
        if amount.is_some_and(|a| a.abs() >= AMOUNT_LIMIT) {
            return Err(DbError::OutOfRange);
        }

        tables.next_wish_id += 1;
        let now = Utc::now();
        let wish = Wish {
            id: tables.next_wish_id,
            celebration_id: new.celebration_id,
            name: new.name.clone(),
            message: new.message.clone(),
            amount,
            approved: false,
            created_at: now,
            updated_at: now,
        };
        tables.wishes.push(wish.clone());
        Ok(wish)
    }

    async fn approve_wish(&self, id: i32) -> DbResult<Option<Wish>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.wishes.iter_mut().find(|w| w.id == id).map(|w| {
            w.approved = true;
            w.updated_at = Utc::now();
            w.clone()
        }))
    }

    async fn delete_wish(&self, id: i32) -> DbResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.wishes.len();
        tables.wishes.retain(|w| w.id != id);
        Ok(tables.wishes.len() < before)
    }
}
