use super::model::{JobRow, JobStatus, MediaRow, TransitionRow};
use crate::infrastructure::db::pool::DbPool;
use sqlx::{Sqlite, Transaction};
use time::OffsetDateTime;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        name        TEXT PRIMARY KEY NOT NULL,
        processor   TEXT NOT NULL,
        status      TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS media (
        job         TEXT NOT NULL,
        name        TEXT NOT NULL,
        status      TEXT NOT NULL,
        updated_at  TEXT NOT NULL,
        PRIMARY KEY (job, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transitions (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        job     TEXT NOT NULL,
        media   TEXT,
        status  TEXT NOT NULL,
        at      TEXT NOT NULL
    )
    "#,
];

pub struct JobRepository;

impl JobRepository {
    pub async fn migrate(pool: &DbPool) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    pub async fn upsert_job(
        tx: &mut Transaction<'_, Sqlite>,
        name: &str,
        processor: &str,
        status: JobStatus,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO jobs (name, processor, status, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET
                processor = excluded.processor,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(processor)
        .bind(status.as_str())
        .bind(at)
        .execute(&mut **tx)
        .await?;

        Self::record_transition(tx, name, None, status, at).await
    }

    pub async fn upsert_media(
        tx: &mut Transaction<'_, Sqlite>,
        job: &str,
        media: &str,
        status: JobStatus,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO media (job, name, status, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (job, name) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(job)
        .bind(media)
        .bind(status.as_str())
        .bind(at)
        .execute(&mut **tx)
        .await?;

        Self::record_transition(tx, job, Some(media), status, at).await
    }

    async fn record_transition(
        tx: &mut Transaction<'_, Sqlite>,
        job: &str,
        media: Option<&str>,
        status: JobStatus,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO transitions (job, media, status, at) VALUES ($1, $2, $3, $4)")
            .bind(job)
            .bind(media)
            .bind(status.as_str())
            .bind(at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn find_job(pool: &DbPool, name: &str) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            "SELECT name, processor, status, updated_at FROM jobs WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_media(pool: &DbPool, job: &str) -> Result<Vec<MediaRow>, sqlx::Error> {
        sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT job, name, status, updated_at
            FROM media
            WHERE job = $1
            ORDER BY name ASC
            "#,
        )
        .bind(job)
        .fetch_all(pool)
        .await
    }

    pub async fn find_transitions(
        pool: &DbPool,
        job: &str,
        media: Option<&str>,
    ) -> Result<Vec<TransitionRow>, sqlx::Error> {
        // media IS $2 matches NULL against NULL, so job-level rows come back for None
        sqlx::query_as::<_, TransitionRow>(
            r#"
            SELECT job, media, status, at
            FROM transitions
            WHERE job = $1 AND media IS $2
            ORDER BY id ASC
            "#,
        )
        .bind(job)
        .bind(media)
        .fetch_all(pool)
        .await
    }
}
