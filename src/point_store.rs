use anyhow::{Context, Result};
use log::warn;
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::models::{Point, SignalId};

/// Storage key for a signal's in-progress points.
pub fn cache_key(signal: SignalId) -> String {
    format!("area_points_{signal}")
}

/// Durable cache of in-progress area points, keyed `area_points_<signal>`.
///
/// Entries survive a restart of the console and are dropped once the area
/// is committed, the capture is cancelled, or a server copy supersedes them.
pub struct PointStore {
    path: Option<PathBuf>,
    data: RwLock<BTreeMap<String, Vec<Point>>>,
}

impl PointStore {
    /// Opens the store backed by `path`, starting empty when the file is
    /// missing or unreadable as JSON.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read point cache from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Discarding corrupt point cache {}: {err}", path.display());
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn load(&self, signal: SignalId) -> Option<Vec<Point>> {
        self.read().get(&cache_key(signal)).cloned()
    }

    /// Replaces the cached points for `signal`. An empty list removes the
    /// entry.
    pub fn save(&self, signal: SignalId, points: &[Point]) -> Result<()> {
        let mut guard = self.write();
        if points.is_empty() {
            guard.remove(&cache_key(signal));
        } else {
            guard.insert(cache_key(signal), points.to_vec());
        }
        self.persist(&guard)
    }

    pub fn clear(&self, signal: SignalId) -> Result<()> {
        let mut guard = self.write();
        if guard.remove(&cache_key(signal)).is_none() {
            return Ok(());
        }
        self.persist(&guard)
    }

    pub fn clear_all(&self) -> Result<()> {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|key, _| !SignalId::ALL.iter().any(|s| *key == cache_key(*s)));
        if guard.len() == before {
            return Ok(());
        }
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<Point>>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<Point>>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &BTreeMap<String, Vec<Point>>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write point cache to {}", path.display()))
    }
}
