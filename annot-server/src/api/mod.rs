//! HTTP API handlers for annot-server

pub mod examples;
pub mod health;
pub mod samples;
pub mod ui;

pub use examples::get_examples;
pub use health::health_routes;
pub use samples::{get_groups, get_sample, get_samples, save_sample};
pub use ui::{serve_app_js, serve_index};
