//! Client core for the scrum board: drag-and-drop reconciliation of issue
//! lists, the REST client it persists through, and the view session that
//! ties them together.

pub mod client;
pub mod config;
pub mod error;
pub mod persistence;
pub mod reconciler;
pub mod session;
pub mod views;

pub use client::{build_query_string, RemoteSnapshot, ScrumClient};
pub use config::{load_settings, ClientSettings};
pub use error::ReconcileError;
pub use persistence::{submit_batch, submit_batches, IssueUpdater};
pub use reconciler::{reconcile_move, Batch, Move, Reconciliation};
pub use session::{
    BoardEvent, BoardSession, FailurePolicy, MoveOutcome, Notification, SeedOutcome, Severity,
    SnapshotSource,
};
pub use views::{backlog_lists, board_columns, format_plural, needs_planning_sprint, View};
