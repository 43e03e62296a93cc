//! Persisted dashboard layout.
//!
//! A tiny JSON key-value file stands in for browser storage. The layout lives
//! under [`LAYOUT_KEY`] as card-id -> `CardStyle`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{CardStyle, DashboardLayout};
use crate::error::AppError;

pub const LAYOUT_KEY: &str = "dashboardLayout";

/// String-keyed JSON store backed by one file.
///
/// A missing file is an empty store. Every `set`/`remove` rewrites the file.
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let entries = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "store file is not valid JSON; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AppError::new(
                    2,
                    format!("Failed to read store '{}': {e}", path.display()),
                ));
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), AppError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", dir.display())))?;
        }
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AppError::new(4, format!("Failed to encode store: {e}")))?;
        fs::write(&self.path, text)
            .map_err(|e| AppError::new(4, format!("Failed to write store '{}': {e}", self.path.display())))
    }
}

/// Stored layout, clamped to the grid. Corrupt entries are logged and ignored.
pub fn load_layout(store: &KeyValueStore) -> Option<DashboardLayout> {
    let value = store.get(LAYOUT_KEY)?;
    match serde_json::from_value::<DashboardLayout>(value.clone()) {
        Ok(layout) => {
            debug!(cards = layout.len(), "restored dashboard layout");
            Some(layout.into_iter().map(|(id, style)| (id, style.clamped())).collect())
        }
        Err(e) => {
            warn!(error = %e, "ignoring corrupt stored layout");
            None
        }
    }
}

pub fn save_layout(store: &mut KeyValueStore, layout: &DashboardLayout) -> Result<(), AppError> {
    let value = serde_json::to_value(layout)
        .map_err(|e| AppError::new(4, format!("Failed to encode layout: {e}")))?;
    store.set(LAYOUT_KEY, value)?;
    debug!(cards = layout.len(), "saved dashboard layout");
    Ok(())
}

pub fn reset_layout(store: &mut KeyValueStore) -> Result<(), AppError> {
    store.remove(LAYOUT_KEY)
}

/// Layout used when nothing is stored: panel order, two cards per row.
pub fn default_layout<'a>(card_ids: impl IntoIterator<Item = &'a str>) -> DashboardLayout {
    card_ids
        .into_iter()
        .enumerate()
        .map(|(order, id)| {
            (
                id.to_string(),
                CardStyle {
                    order,
                    span: CardStyle::GRID_COLUMNS / 2,
                    height: 14,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/storage.json");

        let mut store = KeyValueStore::open(&path).unwrap();
        assert!(load_layout(&store).is_none());

        let mut layout = default_layout(["map-chart", "cases-timeline"]);
        layout.insert("tiny".into(), CardStyle { order: 9, span: 1, height: 1 });
        save_layout(&mut store, &layout).unwrap();

        let reopened = KeyValueStore::open(&path).unwrap();
        let restored = load_layout(&reopened).unwrap();
        assert_eq!(restored["map-chart"].span, 6);
        assert_eq!(restored["tiny"].span, CardStyle::MIN_SPAN);
        assert_eq!(restored["tiny"].height, CardStyle::MIN_HEIGHT);
    }

    #[test]
    fn reset_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = KeyValueStore::open(&path).unwrap();
        store.set("other", Value::from(1)).unwrap();
        save_layout(&mut store, &default_layout(["map-chart"])).unwrap();
        reset_layout(&mut store).unwrap();

        let reopened = KeyValueStore::open(&path).unwrap();
        assert!(reopened.get(LAYOUT_KEY).is_none());
        assert_eq!(reopened.get("other"), Some(&Value::from(1)));
    }

    #[test]
    fn corrupt_layout_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"dashboardLayout": "not a map"}"#).unwrap();
        let store = KeyValueStore::open(&path).unwrap();
        assert!(load_layout(&store).is_none());
    }
}
