use sqlx::{migrate::MigrateDatabase, sqlite::{SqlitePool, SqlitePoolOptions}, Sqlite, Row};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::AppError;
use crate::models::{normalize_selections, poll_id_for, Place, Poll, VoteRecord};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    // In-memory database for tests. A single connection keeps every query on
    // the same sqlite memory instance.
    pub async fn create_in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    // Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // Initialize the database schema
    async fn init_schema(pool: &SqlitePool) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                candidates TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                poll_id TEXT NOT NULL,
                voter_name TEXT NOT NULL,
                selections TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (poll_id, voter_name),
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Create a poll for the given candidates, or return the existing one.
    ///
    /// The poll id is a stable hash over the sorted candidate ids, so the same
    /// shortlist always maps to the same poll no matter the submission order.
    /// Returns the id together with whether a new row was written.
    pub async fn create_poll(&self, candidates: &[Place]) -> Result<(String, bool), AppError> {
        if candidates.is_empty() {
            return Err(AppError::InvalidInput(
                "a poll needs at least one candidate".to_string(),
            ));
        }

        // Drop repeated place ids, keeping the first occurrence
        let mut seen = HashSet::new();
        let unique: Vec<&Place> = candidates
            .iter()
            .filter(|place| seen.insert(place.id.as_str()))
            .collect();

        let poll_id = poll_id_for(candidates)?;

        let exists = sqlx::query("SELECT 1 FROM polls WHERE id = ?")
            .bind(&poll_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if exists {
            return Ok((poll_id, false));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO polls (id, candidates, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&poll_id)
        .bind(serde_json::to_string(&unique)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok((poll_id, inserted > 0))
    }

    // Get a poll by ID
    pub async fn get_poll(&self, poll_id: &str) -> Result<Poll, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, candidates, created_at
            FROM polls
            WHERE id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("poll {poll_id} does not exist")))?;

        let candidates: Vec<Place> = serde_json::from_str(&row.get::<String, _>("candidates"))?;
        let created_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("created_at"))
            .map_err(|e| AppError::Internal(format!("failed to parse created_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Poll {
            id: row.get("id"),
            candidates,
            created_at,
        })
    }

    /// Record a voter's selections, replacing any earlier submission by the
    /// same voter. Validation runs before the write, so a rejected submission
    /// leaves the votes table untouched.
    pub async fn save_vote(
        &self,
        poll_id: &str,
        voter_name: &str,
        selections: Vec<String>,
    ) -> Result<(), AppError> {
        let poll = self.get_poll(poll_id).await?;

        if voter_name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "voter name must not be empty".to_string(),
            ));
        }

        let selections = normalize_selections(selections);
        if let Some(unknown) = selections
            .iter()
            .find(|id| !poll.contains_candidate(id.as_str()))
        {
            return Err(AppError::InvalidInput(format!(
                "selection {unknown} is not a candidate of poll {poll_id}"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO votes (poll_id, voter_name, selections, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(poll_id, voter_name)
            DO UPDATE SET selections = excluded.selections, updated_at = excluded.updated_at
            "#,
        )
        .bind(poll_id)
        .bind(voter_name)
        .bind(serde_json::to_string(&selections)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Get votes for a poll, oldest submission first
    pub async fn get_votes(&self, poll_id: &str) -> Result<Vec<VoteRecord>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT poll_id, voter_name, selections, updated_at
            FROM votes
            WHERE poll_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        let mut votes = Vec::with_capacity(rows.len());
        for row in rows {
            let selections: Vec<String> =
                serde_json::from_str(&row.get::<String, _>("selections"))?;
            let updated_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("updated_at"))
                .map_err(|e| AppError::Internal(format!("failed to parse updated_at: {e}")))?
                .with_timezone(&Utc);

            votes.push(VoteRecord {
                poll_id: row.get("poll_id"),
                voter_name: row.get("voter_name"),
                selections,
                updated_at,
            });
        }

        Ok(votes)
    }
}
