use thiserror::Error;

/// Caller bugs detected while reconciling a move. These are never clamped or
/// recovered from; they point at a drag layer handing out bad locations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("unknown list '{0}'")]
    UnknownList(String),
    #[error("source index {index} out of range for list '{key}' with {len} items")]
    SourceIndexOutOfRange {
        key: String,
        index: usize,
        len: usize,
    },
    #[error("destination index {index} out of range for list '{key}' (max insert position {max})")]
    DestinationIndexOutOfRange {
        key: String,
        index: usize,
        max: usize,
    },
}
