//! Sample progress, view and save endpoints

use std::collections::BTreeMap;

use annot_common::{CurrentAnnotation, Progress, SavePayload};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `?group=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct GroupQuery {
    pub group: Option<String>,
}

impl GroupQuery {
    /// Requested group, "1" when missing or empty
    pub fn group(&self) -> &str {
        self.group
            .as_deref()
            .filter(|g| !g.is_empty())
            .unwrap_or("1")
    }
}

/// Merged sample view
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub index: usize,
    pub image_url: String,
    /// Single entry named after the mode's metadata field
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub annotation: CurrentAnnotation,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: BTreeMap<String, Progress>,
}

/// GET /api/samples?group=G
pub async fn get_samples(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> ApiResult<Json<Progress>> {
    Ok(Json(state.session.progress(query.group())?))
}

/// GET /api/groups
pub async fn get_groups(State(state): State<AppState>) -> ApiResult<Json<GroupsResponse>> {
    let groups = state
        .session
        .group_progress()?
        .into_iter()
        .map(|(group, progress)| (group.to_string(), progress))
        .collect();
    Ok(Json(GroupsResponse { groups }))
}

/// GET /api/sample/:idx?group=G
pub async fn get_sample(
    State(state): State<AppState>,
    Path(idx): Path<i64>,
    Query(query): Query<GroupQuery>,
) -> ApiResult<Json<SampleResponse>> {
    let view = state.session.get_sample(query.group(), idx)?;

    let mut metadata = Map::new();
    metadata.insert(
        state.session.mode().metadata_field().to_string(),
        view.metadata,
    );

    Ok(Json(SampleResponse {
        index: view.index,
        image_url: format!("/images/{}", view.image),
        metadata,
        annotation: view.annotation,
    }))
}

/// POST /api/sample/:idx/save?group=G
///
/// Body is `{text}` or `{bbox: [x1, y1, x2, y2]}` depending on the mode.
/// The file rewrite runs on the blocking pool.
pub async fn save_sample(
    State(state): State<AppState>,
    Path(idx): Path<i64>,
    Query(query): Query<GroupQuery>,
    Json(payload): Json<SavePayload>,
) -> ApiResult<Json<Value>> {
    let group = query.group().to_string();
    let session = state.session.clone();

    tokio::task::spawn_blocking(move || session.save_sample(&group, idx, &payload))
        .await
        .map_err(|e| ApiError::Internal(format!("Save task failed: {}", e)))??;

    Ok(Json(json!({ "ok": true })))
}
