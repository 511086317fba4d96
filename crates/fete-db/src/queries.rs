use async_trait::async_trait;
use sqlx::types::Json;

use fete_types::models::{Admin, Celebration, Wish, WishWithCelebration};

use crate::Database;
use crate::models::{AdminRow, CelebrationRow, WishListRow, WishRow};
use crate::store::{AdminCredentials, CelebrationChanges, DbResult, NewCelebration, NewWish, Store};

const ADMIN_COLUMNS: &str = "id, email, password_hash, created_at";

const CELEBRATION_COLUMNS: &str = "id, title, subtitle, slug, event_type, event_date, story, \
     cover_image, images, videos, qr_image, spotify_code, money_collection_enabled, theme, \
     sections, quotes, created_at, updated_at";

const WISH_COLUMNS: &str =
    "id, celebration_id, name, message, amount, approved, created_at, updated_at";

#[async_trait]
impl Store for Database {
    // -- Admins --

    async fn admin_credentials(&self, email: &str) -> DbResult<Option<AdminCredentials>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1");
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .read(move || async move {
                sqlx::query_as::<_, AdminRow>(sql)
                    .bind(email)
                    .fetch_optional(pool)
                    .await
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn admin_by_id(&self, id: i32) -> DbResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .read(move || async move {
                sqlx::query_as::<_, AdminRow>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            })
            .await?;
        Ok(row.map(Into::into))
    }

    // -- Celebrations --

    async fn list_celebrations(&self) -> DbResult<Vec<Celebration>> {
        let sql = format!(
            "SELECT {CELEBRATION_COLUMNS} FROM celebrations ORDER BY created_at DESC, id DESC"
        );
        let pool = self.pool();
        let sql = sql.as_str();

        let rows = self
            .read(move || async move {
                sqlx::query_as::<_, CelebrationRow>(sql).fetch_all(pool).await
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn celebration_by_id(&self, id: i32) -> DbResult<Option<Celebration>> {
        let sql = format!("SELECT {CELEBRATION_COLUMNS} FROM celebrations WHERE id = $1");
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .read(move || async move {
                sqlx::query_as::<_, CelebrationRow>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn celebration_by_slug(&self, slug: &str) -> DbResult<Option<Celebration>> {
        let sql = format!("SELECT {CELEBRATION_COLUMNS} FROM celebrations WHERE slug = $1");
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .read(move || async move {
                sqlx::query_as::<_, CelebrationRow>(sql)
                    .bind(slug)
                    .fetch_optional(pool)
                    .await
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn celebration_exists(&self, id: i32) -> DbResult<bool> {
        let pool = self.pool();
        self.read(move || async move {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM celebrations WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await
        })
        .await
    }

    async fn slug_taken(&self, slug: &str, excluding: Option<i32>) -> DbResult<bool> {
        let pool = self.pool();
        self.read(move || async move {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(
                     SELECT 1 FROM celebrations
                     WHERE slug = $1 AND ($2::INTEGER IS NULL OR id <> $2)
                 )",
            )
            .bind(slug)
            .bind(excluding)
            .fetch_one(pool)
            .await
        })
        .await
    }

    async fn insert_celebration(&self, new: &NewCelebration) -> DbResult<Celebration> {
        let sql = format!(
            "INSERT INTO celebrations (
                 title, subtitle, slug, event_type, event_date, story, cover_image,
                 images, videos, qr_image, spotify_code, money_collection_enabled,
                 theme, sections, quotes
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {CELEBRATION_COLUMNS}"
        );
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .write(move || async move {
                sqlx::query_as::<_, CelebrationRow>(sql)
                    .bind(&new.title)
                    .bind(&new.subtitle)
                    .bind(&new.slug)
                    .bind(&new.event_type)
                    .bind(new.event_date)
                    .bind(&new.story)
                    .bind(&new.cover_image)
                    .bind(&new.images)
                    .bind(&new.videos)
                    .bind(&new.qr_image)
                    .bind(&new.spotify_code)
                    .bind(new.money_collection_enabled)
                    .bind(Json(&new.theme))
                    .bind(Json(&new.sections))
                    .bind(&new.quotes)
                    .fetch_one(pool)
                    .await
            })
            .await?;
        Ok(row.into())
    }

    async fn update_celebration(
        &self,
        id: i32,
        changes: &CelebrationChanges,
    ) -> DbResult<Option<Celebration>> {
        let sql = format!(
            "UPDATE celebrations SET
                 title = COALESCE($1, title),
                 subtitle = COALESCE($2, subtitle),
                 slug = COALESCE($3, slug),
                 event_type = COALESCE($4, event_type),
                 event_date = COALESCE($5, event_date),
                 story = COALESCE($6, story),
                 cover_image = COALESCE($7, cover_image),
                 images = COALESCE($8, images),
                 videos = COALESCE($9, videos),
                 qr_image = COALESCE($10, qr_image),
                 spotify_code = COALESCE($11, spotify_code),
                 money_collection_enabled = COALESCE($12, money_collection_enabled),
                 theme = COALESCE($13, theme),
                 sections = COALESCE($14, sections),
                 quotes = COALESCE($15, quotes),
                 updated_at = NOW()
             WHERE id = $16
             RETURNING {CELEBRATION_COLUMNS}"
        );
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .write(move || async move {
                sqlx::query_as::<_, CelebrationRow>(sql)
                    .bind(&changes.title)
                    .bind(&changes.subtitle)
                    .bind(&changes.slug)
                    .bind(&changes.event_type)
                    .bind(changes.event_date)
                    .bind(&changes.story)
                    .bind(&changes.cover_image)
                    .bind(&changes.images)
                    .bind(&changes.videos)
                    .bind(&changes.qr_image)
                    .bind(&changes.spotify_code)
                    .bind(changes.money_collection_enabled)
                    .bind(changes.theme.as_ref().map(Json))
                    .bind(changes.sections.as_ref().map(Json))
                    .bind(&changes.quotes)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_celebration(&self, id: i32) -> DbResult<bool> {
        let pool = self.pool();
        let result = self
            .write(move || async move {
                sqlx::query("DELETE FROM celebrations WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Wishes --

    async fn list_wishes(&self) -> DbResult<Vec<WishWithCelebration>> {
        let pool = self.pool();
        let rows = self
            .read(move || async move {
                sqlx::query_as::<_, WishListRow>(
                    "SELECT w.id, w.celebration_id, w.name, w.message, w.amount, w.approved,
                            w.created_at, w.updated_at,
                            c.title AS celebration_title, c.slug AS celebration_slug
                     FROM wishes w
                     LEFT JOIN celebrations c ON w.celebration_id = c.id
                     ORDER BY w.created_at DESC, w.id DESC",
                )
                .fetch_all(pool)
                .await
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn approved_wishes(&self, celebration_id: i32) -> DbResult<Vec<Wish>> {
        let sql = format!(
            "SELECT {WISH_COLUMNS} FROM wishes
             WHERE celebration_id = $1 AND approved
             ORDER BY created_at DESC, id DESC"
        );
        let pool = self.pool();
        let sql = sql.as_str();

        let rows = self
            .read(move || async move {
                sqlx::query_as::<_, WishRow>(sql)
                    .bind(celebration_id)
                    .fetch_all(pool)
                    .await
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_wish(&self, new: &NewWish) -> DbResult<Wish> {
        let sql = format!(
            "INSERT INTO wishes (celebration_id, name, message, amount, approved)
             VALUES ($1, $2, $3, $4, false)
             RETURNING {WISH_COLUMNS}"
        );
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .write(move || async move {
                sqlx::query_as::<_, WishRow>(sql)
                    .bind(new.celebration_id)
                    .bind(&new.name)
                    .bind(&new.message)
                    .bind(new.amount)
                    .fetch_one(pool)
                    .await
            })
            .await?;
        Ok(row.into())
    }

    async fn approve_wish(&self, id: i32) -> DbResult<Option<Wish>> {
        let sql = format!(
            "UPDATE wishes SET approved = true, updated_at = NOW()
             WHERE id = $1
             RETURNING {WISH_COLUMNS}"
        );
        let pool = self.pool();
        let sql = sql.as_str();

        let row = self
            .write(move || async move {
                sqlx::query_as::<_, WishRow>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            })
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_wish(&self, id: i32) -> DbResult<bool> {
        let pool = self.pool();
        let result = self
            .write(move || async move {
                sqlx::query("DELETE FROM wishes WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
