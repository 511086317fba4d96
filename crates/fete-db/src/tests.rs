//! Query tests against a real Postgres server.
//!
//! Each test creates a scratch database next to the one `DATABASE_URL` points
//! at and drops it afterwards. Without `DATABASE_URL` the tests pass
//! trivially.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use serde_json::{Map, Value, json};
use sqlx::migrate::MigrateDatabase;
use url::Url;

use fete_types::models::{Sections, Theme};

use crate::{
    Backoff, CelebrationChanges, Database, DbConfig, DbError, NewCelebration, NewWish, Store,
};

pub struct TestDb {
    pub db: Database,
    url: String,
}

impl TestDb {
    pub async fn postgres() -> Option<Self> {
        static NEXT: AtomicU32 = AtomicU32::new(0);

        let Ok(base) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is not set, skipping Postgres test");
            return None;
        };

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let mut url = Url::parse(&base).unwrap();
        url.set_path(&format!(
            "fete_test_{}_{}_{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst),
            nanos
        ));
        let url = url.to_string();

        sqlx::Postgres::create_database(&url)
            .await
            .expect("failed to create test db");
        let db = Database::connect(&DbConfig {
            url: url.clone(),
            require_tls: false,
            startup_backoff: Backoff::for_queries().with_max_attempts(1),
        })
        .await
        .unwrap();

        Some(Self { db, url })
    }

    pub async fn teardown(self) {
        self.db.close().await;
        sqlx::Postgres::drop_database(&self.url).await.unwrap();
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn page(slug: &str) -> NewCelebration {
    NewCelebration {
        title: "Anna & Ben".into(),
        subtitle: Some("Forever".into()),
        slug: slug.into(),
        event_type: "wedding".into(),
        event_date: None,
        story: None,
        cover_image: Some("https://res.cloudinary.com/demo/image/upload/v1/fete/cover.jpg".into()),
        images: vec!["https://a/1.jpg".into(), "https://a/2.jpg".into()],
        videos: vec![],
        qr_image: None,
        spotify_code: None,
        money_collection_enabled: true,
        theme: Theme(object(json!({ "primaryColor": "#112233", "animationsEnabled": "true" }))),
        sections: Sections::default(),
        quotes: vec!["Love is patient".into()],
    }
}

fn wish(celebration_id: i32, amount: Option<&str>) -> NewWish {
    NewWish {
        celebration_id,
        name: "Gran".into(),
        message: "Congratulations".into(),
        amount: amount.map(|a| Decimal::from_str(a).unwrap()),
    }
}

#[tokio::test]
async fn migrations_can_run_twice() {
    let Some(test_db) = TestDb::postgres().await else {
        return;
    };

    crate::migrations::run(test_db.db.pool()).await.unwrap();
    assert!(test_db.db.list_celebrations().await.unwrap().is_empty());

    assert!(test_db.db.seed_admin("admin@fete.test", "$2b$10$hash").await.unwrap());
    assert!(!test_db.db.seed_admin("admin@fete.test", "$2b$10$other").await.unwrap());

    let creds = test_db
        .db
        .admin_credentials("admin@fete.test")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(creds.password_hash, "$2b$10$hash");
    let admin = test_db.db.admin_by_id(creds.id).await.unwrap().unwrap();
    assert_eq!(admin.email, "admin@fete.test");

    test_db.teardown().await;
}

#[tokio::test]
async fn celebrations_insert_and_partially_update() {
    let Some(test_db) = TestDb::postgres().await else {
        return;
    };
    let db = &test_db.db;

    let created = db.insert_celebration(&page("anna-ben")).await.unwrap();
    assert_eq!(created.theme, page("anna-ben").theme);
    assert_eq!(created.images.len(), 2);
    assert!(created.videos.is_empty());

    assert!(matches!(
        db.insert_celebration(&page("anna-ben")).await.unwrap_err(),
        DbError::UniqueViolation(_)
    ));
    assert!(db.slug_taken("anna-ben", None).await.unwrap());
    assert!(!db.slug_taken("anna-ben", Some(created.id)).await.unwrap());
    assert!(!db.slug_taken("someone-else", None).await.unwrap());

    let changes = CelebrationChanges {
        story: Some("<p>How we met</p>".into()),
        money_collection_enabled: Some(false),
        ..Default::default()
    };
    let updated = db.update_celebration(created.id, &changes).await.unwrap().unwrap();
    assert_eq!(updated.story.as_deref(), Some("<p>How we met</p>"));
    assert!(!updated.money_collection_enabled);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.subtitle, created.subtitle);
    assert_eq!(updated.images, created.images);
    assert_eq!(updated.theme, created.theme);
    assert!(updated.updated_at >= created.updated_at);

    let by_slug = db.celebration_by_slug("anna-ben").await.unwrap().unwrap();
    assert_eq!(by_slug.id, created.id);
    assert!(db.celebration_exists(created.id).await.unwrap());
    assert!(db.update_celebration(created.id + 1000, &changes).await.unwrap().is_none());

    test_db.teardown().await;
}

#[tokio::test]
async fn wishes_join_their_page_and_cascade() {
    let Some(test_db) = TestDb::postgres().await else {
        return;
    };
    let db = &test_db.db;

    let celebration = db.insert_celebration(&page("party")).await.unwrap();
    let pending = db.insert_wish(&wish(celebration.id, Some("25.5"))).await.unwrap();
    assert!(!pending.approved);
    assert_eq!(pending.amount, Some(Decimal::from_str("25.50").unwrap()));
    assert!(db.approved_wishes(celebration.id).await.unwrap().is_empty());

    let approved = db.approve_wish(pending.id).await.unwrap().unwrap();
    assert!(approved.approved);
    assert_eq!(db.approved_wishes(celebration.id).await.unwrap().len(), 1);

    let listed = db.list_wishes().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].wish.id, pending.id);
    let page_ref = listed[0].celebration.as_ref().unwrap();
    assert_eq!(page_ref.slug, "party");
    assert_eq!(page_ref.title, "Anna & Ben");

    assert!(matches!(
        db.insert_wish(&wish(celebration.id + 1000, None)).await.unwrap_err(),
        DbError::MissingReference
    ));
    assert!(matches!(
        db.insert_wish(&wish(celebration.id, Some("100000000"))).await.unwrap_err(),
        DbError::OutOfRange
    ));

    assert!(db.delete_celebration(celebration.id).await.unwrap());
    assert!(db.list_wishes().await.unwrap().is_empty());
    assert!(!db.delete_wish(pending.id).await.unwrap());

    test_db.teardown().await;
}

#[tokio::test]
async fn missing_tables_are_reported() {
    let Some(test_db) = TestDb::postgres().await else {
        return;
    };

    sqlx::query("DROP TABLE wishes").execute(test_db.db.pool()).await.unwrap();
    assert!(matches!(
        test_db.db.approved_wishes(1).await.unwrap_err(),
        DbError::NotInitialized
    ));

    test_db.teardown().await;
}
