//! Cross-environment migration engine: identity resolution, reference
//! rewriting, and the orchestrated fetch/transform/submit flow.

pub mod log;
pub mod orchestrator;
pub mod resolver;
pub mod transform;

use thiserror::Error;

use crate::api::ApiError;
pub use log::LogSink;
pub use orchestrator::{BulkReport, MigrationSession, SnapshotState};
pub use resolver::{FieldMapper, Resolution};
pub use transform::{FormTransform, RefLocation, RefReason, UnresolvedRef};

/// Errors from migration operations. Item failures in bulk operations are
/// reported through the log feed instead and never abort sibling items.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The entity references production fields with no sandbox counterpart;
    /// nothing was submitted.
    #[error("{entity} references {count} field(s) with no usable sandbox mapping", count = refs.len())]
    UnresolvedReferences {
        entity: String,
        refs: Vec<UnresolvedRef>,
    },

    #[error("{0} have not been fetched yet")]
    NotFetched(&'static str),

    #[error("no {kind} with id {id} in the production snapshot")]
    UnknownId { kind: &'static str, id: i64 },
}
