//! Annotation values and save payload normalization

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Which kind of annotation a process records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    /// Free-text annotation, with a category side-file
    Text,
    /// Bounding box `[x1, y1, x2, y2]`, with an intention side-file
    Bbox,
}

impl AnnotationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationMode::Text => "text",
            AnnotationMode::Bbox => "bbox",
        }
    }

    /// Name of the metadata field shown next to each sample
    pub fn metadata_field(self) -> &'static str {
        match self {
            AnnotationMode::Text => "category",
            AnnotationMode::Bbox => "intention",
        }
    }

    /// Conventional side-file name inside the data directory
    pub fn default_metadata_file(self) -> &'static str {
        match self {
            AnnotationMode::Text => "categories.json",
            AnnotationMode::Bbox => "intentions.json",
        }
    }

    /// Port used when none is configured, so both modes can run side by side
    pub fn default_port(self) -> u16 {
        match self {
            AnnotationMode::Text => 5000,
            AnnotationMode::Bbox => 5001,
        }
    }

    /// Normalize a save request
    ///
    /// `None` means "no annotation": the stored entry is deleted.
    pub fn normalize(self, payload: &SavePayload) -> Option<AnnotationValue> {
        match self {
            AnnotationMode::Text => payload
                .text
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(|text| AnnotationValue::Text(text.to_string())),
            AnnotationMode::Bbox => payload
                .bbox
                .as_ref()
                .and_then(parse_bbox)
                .map(AnnotationValue::Bbox),
        }
    }
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(AnnotationMode::Text),
            "bbox" => Ok(AnnotationMode::Bbox),
            other => Err(Error::Config(format!("Unknown annotation mode: {}", other))),
        }
    }
}

/// Stored annotation for one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Text(String),
    Bbox([f64; 4]),
    /// Loaded value of any other shape, written back unchanged
    Raw(Value),
}

impl AnnotationValue {
    /// Classify a value read from the output file
    pub fn from_stored(value: Value) -> Self {
        match value {
            Value::String(text) => AnnotationValue::Text(text),
            other => match serde_json::from_value::<[f64; 4]>(other.clone()) {
                Ok(bbox) => AnnotationValue::Bbox(bbox),
                Err(_) => AnnotationValue::Raw(other),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bbox(&self) -> Option<[f64; 4]> {
        match self {
            AnnotationValue::Bbox(bbox) => Some(*bbox),
            _ => None,
        }
    }
}

/// Request body of a save: `{text}` or `{bbox: [x1, y1, x2, y2]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavePayload {
    #[serde(default)]
    pub text: Option<String>,
    /// Kept raw so malformed boxes degrade to "absent" instead of failing
    #[serde(default)]
    pub bbox: Option<Value>,
}

impl SavePayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            bbox: None,
        }
    }

    pub fn bbox(bbox: Value) -> Self {
        Self {
            text: None,
            bbox: Some(bbox),
        }
    }
}

/// Exactly four coordinates, each a number or a numeric string
fn parse_bbox(value: &Value) -> Option<[f64; 4]> {
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut bbox = [0.0; 4];
    for (slot, item) in bbox.iter_mut().zip(items) {
        *slot = match item {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        if !slot.is_finite() {
            return None;
        }
    }
    Some(bbox)
}
