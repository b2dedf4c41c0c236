use std::{fmt, str::FromStr, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{lists::ListSnapshot, protocol::DragResult};
use tokio::sync::{broadcast, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::{
    error::ReconcileError,
    persistence::{submit_batches, IssueUpdater},
    reconciler::{reconcile_move, Move},
};

/// What to do with the optimistic snapshot when persisting a move fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the local order and tell the user.
    #[default]
    Notify,
    /// Tell the user and reload the authoritative lists.
    Refetch,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notify" => Ok(Self::Notify),
            "refetch" => Ok(Self::Refetch),
            other => Err(anyhow!("unknown failure policy '{other}'")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notify => f.write_str("notify"),
            Self::Refetch => f.write_str("refetch"),
        }
    }
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<ListSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient, dismissable message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: "Error".into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    SnapshotChanged(ListSnapshot),
    Notification(Notification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Cancelled,
    Persisted { batches: usize, updates: usize },
    PersistFailed { refetched: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Applied,
    Deferred,
}

#[derive(Default)]
struct SessionState {
    snapshot: ListSnapshot,
    dragging: bool,
    pending_seed: Option<ListSnapshot>,
    /// Resolves once the most recently committed move has finished persisting
    /// (or was dropped).
    last_persist: Option<oneshot::Receiver<()>>,
}

/// Owns the lists shown by one backlog or board view and drives moves
/// through reconciliation and persistence.
pub struct BoardSession {
    state: RwLock<SessionState>,
    updater: Arc<dyn IssueUpdater>,
    source: Option<Arc<dyn SnapshotSource>>,
    policy: FailurePolicy,
    events: broadcast::Sender<BoardEvent>,
}

impl BoardSession {
    pub fn new(updater: Arc<dyn IssueUpdater>, policy: FailurePolicy) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: RwLock::new(SessionState::default()),
            updater,
            source: None,
            policy,
            events,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn is_dragging(&self) -> bool {
        self.state.read().await.dragging
    }

    /// Replaces local lists with a fetched snapshot. While a drag is in
    /// progress the seed is held back until the gesture ends.
    pub async fn seed(&self, snapshot: ListSnapshot) -> SeedOutcome {
        let mut state = self.state.write().await;
        if state.dragging {
            debug!("drag in progress; deferring seed");
            state.pending_seed = Some(snapshot);
            return SeedOutcome::Deferred;
        }
        state.snapshot = snapshot.clone();
        drop(state);
        let _ = self.events.send(BoardEvent::SnapshotChanged(snapshot));
        SeedOutcome::Applied
    }

    /// Fetches authoritative lists from the configured source and seeds them.
    pub async fn refetch(&self) -> Result<SeedOutcome> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| anyhow!("no snapshot source configured"))?;
        let snapshot = source.fetch_snapshot().await?;
        Ok(self.seed(snapshot).await)
    }

    pub async fn drag_started(&self) {
        self.state.write().await.dragging = true;
    }

    /// Finishes a drag gesture. The new lists are committed and published
    /// before any request is sent. Each move takes its persistence turn in the
    /// same critical section that commits it, so writes reach the server in
    /// commit order.
    pub async fn drag_ended(&self, result: &DragResult) -> Result<MoveOutcome, ReconcileError> {
        let Some(mv) = Move::from_drag(result) else {
            let mut state = self.state.write().await;
            state.dragging = false;
            if let Some(seed) = state.pending_seed.take() {
                state.snapshot = seed.clone();
                drop(state);
                let _ = self.events.send(BoardEvent::SnapshotChanged(seed));
            }
            debug!("drag cancelled");
            return Ok(MoveOutcome::Cancelled);
        };

        let (batches, previous, _turn) = {
            let mut state = self.state.write().await;
            state.dragging = false;
            let deferred = state.pending_seed.take();
            let reconciliation = match reconcile_move(&state.snapshot, &mv) {
                Ok(reconciliation) => reconciliation,
                Err(err) => {
                    if let Some(seed) = deferred {
                        state.snapshot = seed.clone();
                        drop(state);
                        let _ = self.events.send(BoardEvent::SnapshotChanged(seed));
                    }
                    return Err(err);
                }
            };
            state.snapshot = reconciliation.snapshot.clone();
            let (turn, next) = oneshot::channel::<()>();
            let previous = state.last_persist.replace(next);
            let _ = self
                .events
                .send(BoardEvent::SnapshotChanged(reconciliation.snapshot));
            (reconciliation.batches, previous, turn)
        };

        if let Some(previous) = previous {
            // Err means the earlier move finished or was dropped; either way it is our turn.
            let _ = previous.await;
        }
        let updates: usize = batches.iter().map(|batch| batch.len()).sum();
        match submit_batches(self.updater.as_ref(), &batches).await {
            Ok(_) => {
                debug!(
                    source = %mv.source_key,
                    dest = %mv.dest_key,
                    updates,
                    "move persisted"
                );
                Ok(MoveOutcome::Persisted {
                    batches: batches.len(),
                    updates,
                })
            }
            Err(err) => {
                let detail = format!("{err:#}");
                warn!(
                    source = %mv.source_key,
                    dest = %mv.dest_key,
                    error = %detail,
                    "failed to persist move"
                );
                let _ = self.events.send(BoardEvent::Notification(Notification::error(
                    "We could not save the new order. Refresh to see the latest board.",
                )));
                let refetched = match self.policy {
                    FailurePolicy::Notify => false,
                    FailurePolicy::Refetch => match self.refetch().await {
                        Ok(_) => {
                            info!("reloaded lists after failed move");
                            true
                        }
                        Err(err) => {
                            warn!(error = %err, "refetch after failed move failed");
                            false
                        }
                    },
                };
                Ok(MoveOutcome::PersistFailed { refetched })
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
