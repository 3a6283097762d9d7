//! Reference examples shown next to the annotation form
//!
//! The example directory holds `example.json`, mapping an image path
//! relative to that directory to `{category, intention}`.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Index file inside the example directory
pub const EXAMPLE_INDEX: &str = "example.json";

/// URL prefix under which example images are served
pub const EXAMPLE_URL_PREFIX: &str = "/examples";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub image_url: String,
    pub category: Value,
    pub intention: Value,
}

/// Load the example list; no directory or no index file gives an empty list
pub fn load_examples(example_dir: Option<&Path>) -> Result<Vec<Example>> {
    let Some(dir) = example_dir else {
        return Ok(Vec::new());
    };
    let index = dir.join(EXAMPLE_INDEX);
    if !index.is_file() {
        return Ok(Vec::new());
    }

    let load_error = |reason: String| Error::MetadataLoad {
        path: index.clone(),
        reason,
    };
    let content = std::fs::read_to_string(&index).map_err(|e| load_error(e.to_string()))?;
    let raw: serde_json::Map<String, Value> =
        serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?;

    let examples: Vec<Example> = raw
        .into_iter()
        .filter_map(|(rel_path, payload)| {
            let Value::Object(fields) = payload else {
                return None;
            };
            let field = |name: &str| {
                fields
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()))
            };
            Some(Example {
                image_url: format!("{}/{}", EXAMPLE_URL_PREFIX, rel_path),
                category: field("category"),
                intention: field("intention"),
            })
        })
        .collect();

    tracing::info!("Loaded {} examples from {}", examples.len(), index.display());
    Ok(examples)
}
