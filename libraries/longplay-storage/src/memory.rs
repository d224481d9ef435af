//! In-memory implementation of the collaborator traits

use async_trait::async_trait;
use chrono::Utc;
use longplay_core::{HistoryEntry, HistoryStore, LongplayError, SettingsStore, Track, TrackId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    positions: HashMap<TrackId, f64>,
    history: Vec<HistoryEntry>,
    settings: HashMap<String, serde_json::Value>,
    fail_writes: bool,
}

/// Process-local store
///
/// Cloning shares the same underlying maps, so a test can keep one handle
/// while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (exercises persistence fallbacks)
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Insert a raw settings value, bypassing any validation
    pub fn insert_raw_setting(&self, key: &str, value: serde_json::Value) {
        self.lock().settings.insert(key.to_string(), value);
    }

    /// Snapshot of a settings value
    pub fn setting(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().settings.get(key).cloned()
    }

    /// Number of history rows
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Delete everything
    pub fn clear_all(&self) {
        let mut inner = self.lock();
        inner.positions.clear();
        inner.history.clear();
        inner.settings.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned map is still structurally valid
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_writable(inner: &Inner) -> longplay_core::Result<()> {
        if inner.fail_writes {
            return Err(LongplayError::storage("writes disabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn get_resume_position(&self, track_id: &TrackId) -> longplay_core::Result<Option<f64>> {
        Ok(self.lock().positions.get(track_id).copied())
    }

    async fn get_recent_history(&self, limit: usize) -> longplay_core::Result<Vec<HistoryEntry>> {
        let inner = self.lock();
        // newest insert first so equal timestamps keep recency order
        let mut entries: Vec<HistoryEntry> = inner.history.iter().rev().cloned().collect();
        entries.sort_by(|a, b| b.played_at.cmp(&a.played_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn record_position(&self, track_id: &TrackId, position: f64) -> longplay_core::Result<()> {
        let mut inner = self.lock();
        Self::check_writable(&inner)?;
        inner.positions.insert(track_id.clone(), position);
        if let Some(entry) = inner.history.iter_mut().find(|e| &e.track.id == track_id) {
            entry.last_position = position;
        }
        Ok(())
    }

    async fn record_history_entry(
        &self,
        track: &Track,
        position: f64,
        duration: Option<f64>,
    ) -> longplay_core::Result<()> {
        let mut inner = self.lock();
        Self::check_writable(&inner)?;
        inner.history.retain(|e| e.track.id != track.id);
        inner.history.push(HistoryEntry {
            track: track.clone(),
            last_position: position,
            duration,
            played_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_value(&self, key: &str) -> longplay_core::Result<Option<serde_json::Value>> {
        Ok(self.lock().settings.get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: serde_json::Value) -> longplay_core::Result<()> {
        let mut inner = self.lock();
        Self::check_writable(&inner)?;
        inner.settings.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_position_updates_history_row() {
        let store = MemoryStore::new();
        let track = Track::new("a", "A");

        store.record_history_entry(&track, 0.0, Some(600.0)).await.unwrap();
        store.record_position(&track.id, 120.0).await.unwrap();

        let history = store.get_recent_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].last_position, 120.0);
        assert_eq!(store.get_resume_position(&track.id).await.unwrap(), Some(120.0));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_deduplicated() {
        let store = MemoryStore::new();
        let a = Track::new("a", "A");
        let b = Track::new("b", "B");

        store.record_history_entry(&a, 0.0, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store.record_history_entry(&b, 0.0, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store.record_history_entry(&a, 5.0, None).await.unwrap();

        let history = store.get_recent_history(10).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|e| e.track.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failing_writes_leave_state_untouched() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        assert!(store.set_value("k", serde_json::json!(1)).await.is_err());
        assert!(store.get_value("k").await.unwrap().is_none());
    }
}
