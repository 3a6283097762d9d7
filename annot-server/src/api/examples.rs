//! Reference example listing

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET /api/examples
pub async fn get_examples(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "examples": state.examples.as_slice() }))
}
