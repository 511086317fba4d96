use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

pub async fn run(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        r##"
        CREATE TABLE IF NOT EXISTS admins (
            id              SERIAL PRIMARY KEY,
            email           VARCHAR(255) NOT NULL UNIQUE,
            password_hash   VARCHAR(255) NOT NULL,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS celebrations (
            id                          SERIAL PRIMARY KEY,
            title                       VARCHAR(255) NOT NULL,
            subtitle                    TEXT,
            slug                        VARCHAR(255) NOT NULL UNIQUE,
            event_type                  VARCHAR(50) NOT NULL DEFAULT 'wedding',
            event_date                  DATE,
            story                       TEXT,
            cover_image                 TEXT,
            images                      TEXT[] NOT NULL DEFAULT '{}',
            videos                      TEXT[] NOT NULL DEFAULT '{}',
            qr_image                    TEXT,
            spotify_code                TEXT,
            money_collection_enabled    BOOLEAN NOT NULL DEFAULT false,
            theme                       JSONB NOT NULL DEFAULT
                '{"primaryColor": "#9B7EDE", "secondaryColor": "#E8D5FF",
                  "animationsEnabled": true}'::jsonb,
            sections                    JSONB NOT NULL DEFAULT
                '{"header": true, "story": true, "gallery": true, "wishes": true,
                  "contribution": true}'::jsonb,
            quotes                      TEXT[] NOT NULL DEFAULT '{}',
            created_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS wishes (
            id              SERIAL PRIMARY KEY,
            celebration_id  INTEGER NOT NULL REFERENCES celebrations(id) ON DELETE CASCADE,
            name            VARCHAR(255) NOT NULL,
            message         TEXT NOT NULL,
            amount          NUMERIC(10, 2),
            approved        BOOLEAN NOT NULL DEFAULT false,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );

        CREATE INDEX IF NOT EXISTS idx_celebrations_slug
            ON celebrations(slug);

        CREATE INDEX IF NOT EXISTS idx_wishes_celebration_id
            ON wishes(celebration_id);

        CREATE INDEX IF NOT EXISTS idx_wishes_approved
            ON wishes(approved);
        "##,
    )
    .execute(pool)
    .await?;

    info!("Database migrations complete");
    Ok(())
}

/// Create the admin account if no admin with that email exists yet.
/// Returns true when a row was inserted.
pub async fn seed_admin(pool: &PgPool, email: &str, password_hash: &str) -> Result<bool> {
    let inserted = sqlx::query(
        "INSERT INTO admins (email, password_hash) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        info!("Seeded admin account {}", email);
    }
    Ok(inserted > 0)
}
