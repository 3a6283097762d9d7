//! annot-server library - image annotation HTTP service
//!
//! Exposes the router and application state for integration testing.

use std::path::PathBuf;
use std::sync::Arc;

use annot_common::gallery::{self, Example};
use annot_common::{
    AnnotationSession, AnnotationStore, Error, GroupMap, GroupedSamples, MetadataMap, Result,
    SampleScanner,
};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod config;
pub mod error;

pub use crate::config::{Args, ServerConfig};
pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Samples, metadata and the annotation store
    pub session: Arc<AnnotationSession>,
    /// Reference examples listed by /api/examples
    pub examples: Arc<Vec<Example>>,
    /// Root served under /images
    pub data_dir: PathBuf,
    /// Root served under /examples
    pub example_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        session: AnnotationSession,
        examples: Vec<Example>,
        data_dir: PathBuf,
        example_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            session: Arc::new(session),
            examples: Arc::new(examples),
            data_dir,
            example_dir,
        }
    }

    /// Scan the data directory and load every side-file
    ///
    /// Malformed side-files abort startup; a corrupt output file does not.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let store = AnnotationStore::load(&config.output_file)?;
        let metadata = MetadataMap::load(Some(&config.metadata_file))?;
        info!(
            "{} lookup keys loaded for field '{}'",
            metadata.len(),
            config.mode.metadata_field()
        );

        let samples = SampleScanner::new()
            .scan(&config.data_dir)
            .map_err(|e| Error::Config(e.to_string()))?;
        info!("Found {} samples in {}", samples.len(), config.data_dir.display());

        let groups = match &config.group_file {
            Some(path) => {
                let group_map = GroupMap::load_groups(Some(path))?;
                GroupedSamples::partition(&samples, &group_map)
            }
            None => {
                info!("No group file, all samples assigned to group 1");
                GroupedSamples::single(samples)
            }
        };
        for (group, list) in groups.non_empty() {
            info!("Group {}: {} samples", group, list.len());
        }

        let examples = gallery::load_examples(config.example_dir.as_deref())?;
        let session = AnnotationSession::new(config.mode, groups, metadata, store);

        Ok(Self::new(
            session,
            examples,
            config.data_dir.clone(),
            config.example_dir.clone(),
        ))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let mut router = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/samples", get(api::get_samples))
        .route("/api/groups", get(api::get_groups))
        .route("/api/examples", get(api::get_examples))
        .route("/api/sample/:idx", get(api::get_sample))
        .route("/api/sample/:idx/save", post(api::save_sample))
        .merge(api::health_routes())
        .nest_service("/images", ServeDir::new(&state.data_dir));

    if let Some(example_dir) = &state.example_dir {
        router = router.nest_service(gallery::EXAMPLE_URL_PREFIX, ServeDir::new(example_dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
