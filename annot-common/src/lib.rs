//! # Annotation engine
//!
//! Shared core of the image annotation server:
//! - Lookup key derivation for sample paths
//! - Image sample scanning
//! - Metadata and group side-files
//! - Group partitioning
//! - The JSON-file annotation store and its group lock
//! - The query/save façade used by the HTTP layer

pub mod annotation;
pub mod error;
pub mod gallery;
pub mod groups;
pub mod keys;
pub mod metadata;
pub mod scanner;
pub mod session;
pub mod store;

pub use annotation::{AnnotationMode, AnnotationValue, SavePayload};
pub use error::{Error, Result};
pub use groups::{GroupId, GroupedSamples};
pub use metadata::{GroupMap, MetadataMap};
pub use scanner::SampleScanner;
pub use session::{AnnotationSession, CurrentAnnotation, Progress, SampleView};
pub use store::AnnotationStore;
