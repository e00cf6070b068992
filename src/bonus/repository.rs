use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::business_rules::{LedgerEntry, NewLedgerEntry};
use crate::error::ApiError;

const ENTRY_COLUMNS: &str =
    "id, user_id, entry_type, points, booking_id, description, created_at, expires_at";

/// Append-only bonus ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BonusLedgerRepository: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, ApiError>;

    /// Every entry of a user, oldest first, expired ones included
    async fn entries_for_user(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, ApiError>;

    /// Append entries atomically
    async fn append_entries(&self, entries: Vec<NewLedgerEntry>) -> Result<Vec<LedgerEntry>, ApiError>;
}

pub(crate) async fn select_entries_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(&format!(
        "SELECT {} FROM bonus_entries WHERE user_id = $1 ORDER BY created_at, id",
        ENTRY_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
}

pub(crate) async fn insert_ledger_entry(
    conn: &mut PgConnection,
    entry: &NewLedgerEntry,
) -> Result<LedgerEntry, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(&format!(
        r#"
        INSERT INTO bonus_entries
            (user_id, entry_type, points, booking_id, description, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        ENTRY_COLUMNS
    ))
    .bind(entry.user_id)
    .bind(entry.entry_type)
    .bind(entry.points)
    .bind(entry.booking_id)
    .bind(&entry.description)
    .bind(entry.created_at)
    .bind(entry.expires_at)
    .fetch_one(conn)
    .await
}

/// PostgreSQL bonus ledger
#[derive(Clone)]
pub struct PgBonusLedgerRepository {
    pool: PgPool,
}

impl PgBonusLedgerRepository {
    /// Create a new PgBonusLedgerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BonusLedgerRepository for PgBonusLedgerRepository {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn entries_for_user(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, ApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(select_entries_for_user(&mut *conn, user_id).await?)
    }

    async fn append_entries(&self, entries: Vec<NewLedgerEntry>) -> Result<Vec<LedgerEntry>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let mut stored = Vec::with_capacity(entries.len());
        for entry in &entries {
            stored.push(insert_ledger_entry(&mut *tx, entry).await?);
        }

        tx.commit().await?;
        Ok(stored)
    }
}
