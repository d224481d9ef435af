//! `SQLite` implementation of the collaborator traits

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use longplay_core::{HistoryEntry, HistoryStore, SettingsStore, Track, TrackId};
use sqlx::{Row, SqlitePool};

/// Durable store backed by a `SQLite` database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool (migrations must already have run)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and migrate it
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Delete all history, resume checkpoints and settings
    pub async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM history").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM resume_positions")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM settings").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn resume_position(&self, track_id: &TrackId) -> Result<Option<f64>> {
        let row = sqlx::query("SELECT position FROM resume_positions WHERE track_id = ?")
            .bind(track_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.try_get::<f64, _>("position")).transpose()?)
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT track_json, last_position, duration, played_at
             FROM history
             ORDER BY played_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let track_json: String = row.try_get("track_json")?;
            // A corrupt row should not hide the rest of the history
            let track: Track = match serde_json::from_str(&track_json) {
                Ok(track) => track,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed history row");
                    continue;
                }
            };
            let played_at_ms: i64 = row.try_get("played_at")?;
            entries.push(HistoryEntry {
                track,
                last_position: row.try_get("last_position")?,
                duration: row.try_get("duration")?,
                played_at: DateTime::from_timestamp_millis(played_at_ms).unwrap_or_default(),
            });
        }
        Ok(entries)
    }

    async fn save_position(&self, track_id: &TrackId, position: f64) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO resume_positions (track_id, position, saved_at)
             VALUES (?, ?, ?)
             ON CONFLICT(track_id) DO UPDATE SET
                position = excluded.position,
                saved_at = excluded.saved_at",
        )
        .bind(track_id.as_str())
        .bind(position)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE history SET last_position = ? WHERE track_id = ?")
            .bind(position)
            .bind(track_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save_history_entry(
        &self,
        track: &Track,
        position: f64,
        duration: Option<f64>,
    ) -> Result<()> {
        let track_json = serde_json::to_string(track)?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            "INSERT INTO history (track_id, track_json, last_position, duration, played_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(track_id) DO UPDATE SET
                track_json = excluded.track_json,
                last_position = excluded.last_position,
                duration = COALESCE(excluded.duration, history.duration),
                played_at = excluded.played_at",
        )
        .bind(track.id.as_str())
        .bind(track_json)
        .bind(position)
        .bind(duration)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                let value = serde_json::from_str(&raw)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn save_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        let now = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(raw)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn get_resume_position(&self, track_id: &TrackId) -> longplay_core::Result<Option<f64>> {
        Ok(self.resume_position(track_id).await?)
    }

    async fn get_recent_history(&self, limit: usize) -> longplay_core::Result<Vec<HistoryEntry>> {
        Ok(self.recent_history(limit).await?)
    }

    async fn record_position(&self, track_id: &TrackId, position: f64) -> longplay_core::Result<()> {
        Ok(self.save_position(track_id, position).await?)
    }

    async fn record_history_entry(
        &self,
        track: &Track,
        position: f64,
        duration: Option<f64>,
    ) -> longplay_core::Result<()> {
        Ok(self.save_history_entry(track, position, duration).await?)
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get_value(&self, key: &str) -> longplay_core::Result<Option<serde_json::Value>> {
        Ok(self.setting(key).await?)
    }

    async fn set_value(&self, key: &str, value: serde_json::Value) -> longplay_core::Result<()> {
        Ok(self.save_setting(key, &value).await?)
    }
}
