//! Session controller for field work: wires user events to the stores and
//! mirrors recordings to an optional remote backend.

use fieldkit_core::PlanError;
use fieldkit_storage::StorageError;
use thiserror::Error;

pub mod location;
pub mod session;
pub mod sync;

pub use location::LocationEvent;
pub use session::{FieldSession, PointStatus};
pub use sync::{RemoteSync, SyncConfig, SyncError, SyncRecord};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown sampling point {0}")]
    UnknownPoint(u32),
    #[error("no sampling point selected")]
    NothingSelected,
    #[error("unknown checklist item {0}")]
    UnknownChecklistItem(usize),
    #[error("invalid sampling plan: {0}")]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to deliver export {file_name}: {source}")]
    Export {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}
