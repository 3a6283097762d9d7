//! Annotation store backed by a single JSON file
//!
//! The file is one JSON object. The reserved key [`LOCK_KEY`] carries the
//! group the file is bound to; every other key is an episode id mapped to
//! its annotation. Each successful save rewrites the whole file through a
//! temp file and a rename, so the file on disk always matches the
//! in-memory state of the last completed save.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::annotation::AnnotationValue;
use crate::error::{Error, Result};
use crate::groups::{self, GroupId};

/// Reserved key holding the group lock
pub const LOCK_KEY: &str = "__group__";

/// In-memory annotation records plus the output lock
#[derive(Debug)]
pub struct AnnotationStore {
    path: PathBuf,
    records: BTreeMap<String, AnnotationValue>,
    lock: Option<GroupId>,
}

impl AnnotationStore {
    /// Empty store that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
            lock: None,
        }
    }

    /// Load the store from `path`
    ///
    /// A missing file, empty content, invalid UTF-8 or invalid JSON all
    /// start from an empty store; corrupt content is logged as a warning.
    /// Only a failure to read an existing file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);
        if !store.path.is_file() {
            info!("Output file: {} (new)", store.path.display());
            return Ok(store);
        }

        let bytes = fs::read(&store.path)?;
        let content = match std::str::from_utf8(&bytes) {
            Ok(content) => content.trim(),
            Err(e) => {
                warn!("{} is not valid UTF-8 ({}), starting fresh.", store.path.display(), e);
                return Ok(store);
            }
        };
        if content.is_empty() {
            info!("Output file {} is empty, starting fresh", store.path.display());
            return Ok(store);
        }

        let raw = match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(raw)) => raw,
            Ok(_) => {
                warn!("{} is not a JSON object, starting fresh.", store.path.display());
                return Ok(store);
            }
            Err(e) => {
                warn!("{} is not valid JSON ({}), starting fresh.", store.path.display(), e);
                return Ok(store);
            }
        };

        for (key, value) in raw {
            if key == LOCK_KEY {
                store.lock = GroupId::from_json(&value);
                if store.lock.is_none() {
                    warn!("Ignoring unrecognized group lock {} in {}", value, store.path.display());
                }
                continue;
            }
            let annotation = AnnotationValue::from_stored(value);
            if let AnnotationValue::Raw(_) = annotation {
                warn!("Keeping unrecognized annotation for {:?} as-is", key);
            }
            store.records.insert(key, annotation);
        }

        info!(
            "Loaded {} existing annotations from {}",
            store.records.len(),
            store.path.display()
        );
        if let Some(lock) = store.lock {
            info!("Output file locked to group {}", lock);
        }
        Ok(store)
    }

    /// Group the output file is bound to, if any save has happened
    pub fn lock(&self) -> Option<GroupId> {
        self.lock
    }

    pub fn get(&self, episode_id: &str) -> Option<&AnnotationValue> {
        self.records.get(episode_id)
    }

    /// Stored text, or "" when there is none
    pub fn text(&self, episode_id: &str) -> &str {
        self.get(episode_id)
            .and_then(AnnotationValue::as_text)
            .unwrap_or("")
    }

    /// Stored bounding box, if any
    pub fn bbox(&self, episode_id: &str) -> Option<[f64; 4]> {
        self.get(episode_id).and_then(AnnotationValue::as_bbox)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store or delete an annotation on behalf of `group`, then persist
    ///
    /// `None` deletes the entry. A group other than the lock holder gets
    /// [`Error::LockConflict`] and nothing changes. An episode id equal to
    /// [`LOCK_KEY`] is rejected before any mutation. If the rewrite fails,
    /// memory is rolled back so it still matches the file.
    pub fn upsert(
        &mut self,
        group: GroupId,
        episode_id: &str,
        value: Option<AnnotationValue>,
    ) -> Result<()> {
        if episode_id == LOCK_KEY {
            return Err(Error::ReservedEpisodeId(episode_id.to_string()));
        }
        if let Some(locked) = self.lock {
            if locked != group {
                return Err(Error::LockConflict {
                    locked: locked.to_string(),
                });
            }
        }

        let previous_lock = self.lock.replace(group);
        let previous = match value {
            Some(value) => self.records.insert(episode_id.to_string(), value),
            None => self.records.remove(episode_id),
        };

        if let Err(e) = self.persist() {
            self.lock = previous_lock;
            match previous {
                Some(old) => {
                    self.records.insert(episode_id.to_string(), old);
                }
                None => {
                    self.records.remove(episode_id);
                }
            }
            return Err(e);
        }

        if previous_lock.is_none() {
            info!("Output file {} locked to group {}", self.path.display(), group);
        }
        debug!("Saved annotation for {} (group {})", episode_id, group);
        Ok(())
    }

    /// Records whose episode id belongs to `samples`
    pub fn count_annotated(&self, samples: &[String]) -> usize {
        let ids: HashSet<&str> = groups::episode_ids(samples).collect();
        self.records
            .keys()
            .filter(|id| ids.contains(id.as_str()))
            .count()
    }

    /// JSON document mirrored to disk
    pub fn to_json(&self) -> Result<Value> {
        let mut doc = Map::new();
        if let Some(lock) = self.lock {
            doc.insert(LOCK_KEY.to_string(), Value::String(lock.to_string()));
        }
        for (id, value) in &self.records {
            doc.insert(id.clone(), serde_json::to_value(value)?);
        }
        Ok(Value::Object(doc))
    }

    /// Atomically rewrite the backing file with the full state
    pub fn persist(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.to_json()?)?;
        content.push('\n');
        write_atomic(&self.path, content.as_bytes())
    }
}

/// Write `bytes` to `<path>.tmp`, sync it, then rename over `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Internal(format!("Invalid output path: {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }
    Ok(())
}
