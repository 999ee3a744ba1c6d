use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use std::str::FromStr;
use tokio::fs;
use tracing::info;

use super::{decode_stored, RepositoryError, TextRepository, Versioned, INITIAL_VERSION};
use crate::shuttle::{LegislativeText, Location, TextId};

/// SQLite-backed repository. The aggregate is stored as JSON next to its
/// version and current location; `save` is a single conditional `UPDATE`.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (and create if needed) the database, running migrations when asked
    pub async fn connect(database_url: &str, auto_migrate: bool) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)?;
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(sqlx::Error::from)?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Versioned<LegislativeText>, RepositoryError> {
        let version: i64 = row.try_get("version")?;
        let location: String = row.try_get("location")?;
        let body: String = row.try_get("body")?;

        // Surface a location this build does not know before trying the JSON body
        location
            .parse::<Location>()
            .map_err(|_| RepositoryError::UnknownLocation(location.clone()))?;

        let text: LegislativeText = decode_stored(&body, "")?;
        Ok(Versioned::new(version as u64, text))
    }
}

#[async_trait]
impl TextRepository for SqliteRepository {
    async fn insert(&self, text: &LegislativeText) -> Result<u64, RepositoryError> {
        let body = serde_json::to_string(text)?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO legislative_texts (id, reference, location, version, body, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(text.id().to_string())
        .bind(text.reference())
        .bind(text.current_location().as_str())
        .bind(INITIAL_VERSION as i64)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists(text.id()));
        }
        Ok(INITIAL_VERSION)
    }

    async fn load(&self, id: TextId) -> Result<Option<Versioned<LegislativeText>>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT version, location, body
            FROM legislative_texts
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn save(&self, text: &LegislativeText, expected_version: u64) -> Result<u64, RepositoryError> {
        let body = serde_json::to_string(text)?;
        let next = expected_version + 1;
        let result = sqlx::query(
            r#"
            UPDATE legislative_texts
            SET version = ?1, location = ?2, body = ?3, updated_at = ?4
            WHERE id = ?5 AND version = ?6
            "#,
        )
        .bind(next as i64)
        .bind(text.current_location().as_str())
        .bind(body)
        .bind(Utc::now())
        .bind(text.id().to_string())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }

        let found: Option<i64> = sqlx::query_scalar("SELECT version FROM legislative_texts WHERE id = ?1")
            .bind(text.id().to_string())
            .fetch_optional(&self.pool)
            .await?;
        match found {
            Some(found) => Err(RepositoryError::VersionMismatch {
                text_id: text.id(),
                expected: expected_version,
                found: found as u64,
            }),
            None => Err(RepositoryError::Missing(text.id())),
        }
    }

    async fn list(&self) -> Result<Vec<Versioned<LegislativeText>>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT version, location, body
            FROM legislative_texts
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode).collect()
    }
}
