//! Query/save façade over the scanned samples, metadata and store
//!
//! An [`AnnotationSession`] is built once at startup and shared by every
//! request. Samples and metadata are immutable; the store sits behind a
//! mutex so each save runs lock-check, mutation and file rewrite as one
//! step.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;

use crate::annotation::{AnnotationMode, SavePayload};
use crate::error::{Error, Result};
use crate::groups::{GroupId, GroupedSamples};
use crate::keys;
use crate::metadata::MetadataMap;
use crate::store::AnnotationStore;

/// Progress of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub annotated: usize,
}

/// Current annotation of a sample, shaped by the session mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CurrentAnnotation {
    Text { text: String },
    Bbox { bbox: Option<[f64; 4]> },
}

/// Merged per-sample view
#[derive(Debug, Clone, PartialEq)]
pub struct SampleView {
    pub index: usize,
    /// Data-root-relative image path
    pub image: String,
    pub episode_id: String,
    /// Resolved category (text mode) or intention (bbox mode); "" if none
    pub metadata: Value,
    pub annotation: CurrentAnnotation,
}

/// Process-wide annotation context
#[derive(Debug)]
pub struct AnnotationSession {
    mode: AnnotationMode,
    groups: GroupedSamples,
    metadata: MetadataMap,
    store: Mutex<AnnotationStore>,
}

impl AnnotationSession {
    pub fn new(
        mode: AnnotationMode,
        groups: GroupedSamples,
        metadata: MetadataMap,
        store: AnnotationStore,
    ) -> Self {
        Self {
            mode,
            groups,
            metadata,
            store: Mutex::new(store),
        }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn groups(&self) -> &GroupedSamples {
        &self.groups
    }

    /// `{total, annotated}` for a raw group id (unknown → empty)
    pub fn progress(&self, group: &str) -> Result<Progress> {
        let samples = self.groups.samples_for(group);
        let store = self.store()?;
        Ok(Progress {
            total: samples.len(),
            annotated: store.count_annotated(samples),
        })
    }

    /// Progress of every non-empty group
    pub fn group_progress(&self) -> Result<Vec<(GroupId, Progress)>> {
        let store = self.store()?;
        Ok(self
            .groups
            .non_empty()
            .map(|(group, samples)| {
                let progress = Progress {
                    total: samples.len(),
                    annotated: store.count_annotated(samples),
                };
                (group, progress)
            })
            .collect())
    }

    /// Merged view of the sample at `index` in `group`
    pub fn get_sample(&self, group: &str, index: i64) -> Result<SampleView> {
        let (position, image) = self.locate(group, index)?;
        let episode_id = keys::episode_id(image);

        let metadata = self
            .metadata
            .resolve_present(image)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));

        let store = self.store()?;
        let annotation = match self.mode {
            AnnotationMode::Text => CurrentAnnotation::Text {
                text: store.text(episode_id).to_string(),
            },
            AnnotationMode::Bbox => CurrentAnnotation::Bbox {
                bbox: store.bbox(episode_id),
            },
        };

        Ok(SampleView {
            index: position,
            image: image.clone(),
            episode_id: episode_id.to_string(),
            metadata,
            annotation,
        })
    }

    /// Validate, store or delete, and persist the annotation at `index`
    pub fn save_sample(&self, group: &str, index: i64, payload: &SavePayload) -> Result<()> {
        let (_, image) = self.locate(group, index)?;
        let group_id: GroupId = group.parse()?;
        let episode_id = keys::episode_id(image);
        let value = self.mode.normalize(payload);

        let mut store = self.store()?;
        if let Err(e) = store.upsert(group_id, episode_id, value) {
            if let Error::LockConflict { locked } = &e {
                tracing::warn!(
                    "Rejected save of {} from group {}: output locked to group {}",
                    episode_id,
                    group_id,
                    locked
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Bounds-check `index` against the group's list
    fn locate(&self, group: &str, index: i64) -> Result<(usize, &String)> {
        let samples = self.groups.samples_for(group);
        usize::try_from(index)
            .ok()
            .and_then(|i| samples.get(i).map(|image| (i, image)))
            .ok_or_else(|| Error::IndexOutOfRange {
                group: group.to_string(),
                index,
                len: samples.len(),
            })
    }

    fn store(&self) -> Result<MutexGuard<'_, AnnotationStore>> {
        self.store
            .lock()
            .map_err(|_| Error::Internal("annotation store mutex poisoned".to_string()))
    }
}
