//! Turns one drag-and-drop move into a new list snapshot plus the minimal
//! per-list update batches needed to persist it.

use shared::{
    domain::{IssueId, IssueStatus},
    lists::{BucketValue, ListSnapshot, OrderedList},
    protocol::{DragResult, IssueForUpdate},
};

use crate::error::ReconcileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub source_key: String,
    pub source_index: usize,
    pub dest_key: String,
    pub dest_index: usize,
}

impl Move {
    pub fn new(
        source_key: impl Into<String>,
        source_index: usize,
        dest_key: impl Into<String>,
        dest_index: usize,
    ) -> Self {
        Self {
            source_key: source_key.into(),
            source_index,
            dest_key: dest_key.into(),
            dest_index,
        }
    }

    /// `None` for a cancelled drag; callers must skip reconciliation entirely.
    pub fn from_drag(result: &DragResult) -> Option<Self> {
        let destination = result.destination.as_ref()?;
        Some(Self::new(
            result.source.droppable_id.clone(),
            result.source.index,
            destination.droppable_id.clone(),
            destination.index,
        ))
    }

    pub fn is_cross_list(&self) -> bool {
        self.source_key != self.dest_key
    }
}

/// Updates for every item of one affected list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub list_key: String,
    pub updates: Vec<IssueForUpdate>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub snapshot: ListSnapshot,
    pub batches: Vec<Batch>,
}

impl Reconciliation {
    pub fn update_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

/// Applies `mv` to a copy of `snapshot`.
///
/// Same-list moves produce one batch covering the whole list. Cross-list moves
/// produce a source batch and a destination batch, in that order; only the
/// moved issue's entry carries bucket fields. Both touched lists come back
/// with `board_order == index`.
pub fn reconcile_move(snapshot: &ListSnapshot, mv: &Move) -> Result<Reconciliation, ReconcileError> {
    let source = lookup(snapshot, &mv.source_key)?;
    let dest = lookup(snapshot, &mv.dest_key)?;

    if mv.source_index >= source.len() {
        return Err(ReconcileError::SourceIndexOutOfRange {
            key: mv.source_key.clone(),
            index: mv.source_index,
            len: source.len(),
        });
    }

    let max_insert = dest.len();
    if mv.dest_index > max_insert {
        return Err(ReconcileError::DestinationIndexOutOfRange {
            key: mv.dest_key.clone(),
            index: mv.dest_index,
            max: max_insert,
        });
    }

    let mut next = snapshot.clone();

    if !mv.is_cross_list() {
        let list = lookup_mut(&mut next, &mv.source_key)?;
        let moved = list.items.remove(mv.source_index);
        // The list is one shorter after the removal; an index of `len` appends.
        let at = mv.dest_index.min(list.items.len());
        list.items.insert(at, moved);
        list.renumber();
        let batch = order_batch(list, None);
        return Ok(Reconciliation {
            snapshot: next,
            batches: vec![batch],
        });
    }

    let source = lookup_mut(&mut next, &mv.source_key)?;
    let mut moved = source.items.remove(mv.source_index);
    source.renumber();
    let source_batch = order_batch(source, None);

    let dest = lookup_mut(&mut next, &mv.dest_key)?;
    dest.bucket.assign(&mut moved);
    let moved_id = moved.id;
    dest.items.insert(mv.dest_index, moved);
    dest.renumber();
    let dest_batch = order_batch(dest, Some(moved_id));

    Ok(Reconciliation {
        snapshot: next,
        batches: vec![source_batch, dest_batch],
    })
}

fn lookup<'a>(snapshot: &'a ListSnapshot, key: &str) -> Result<&'a OrderedList, ReconcileError> {
    snapshot
        .get(key)
        .ok_or_else(|| ReconcileError::UnknownList(key.to_string()))
}

fn lookup_mut<'a>(
    snapshot: &'a mut ListSnapshot,
    key: &str,
) -> Result<&'a mut OrderedList, ReconcileError> {
    snapshot
        .get_mut(key)
        .ok_or_else(|| ReconcileError::UnknownList(key.to_string()))
}

fn order_batch(list: &OrderedList, moved: Option<IssueId>) -> Batch {
    let updates = list
        .items
        .iter()
        .map(|item| {
            let mut update = IssueForUpdate::order_only(item.id, item.board_order);
            if moved == Some(item.id) {
                write_bucket(&mut update, list.bucket);
            }
            update
        })
        .collect();
    Batch {
        list_key: list.key.clone(),
        updates,
    }
}

fn write_bucket(update: &mut IssueForUpdate, bucket: BucketValue) {
    match bucket {
        BucketValue::Status(status) => update.status = Some(status),
        BucketValue::Sprint(sprint_id) => {
            update.sprint_id = Some(sprint_id);
            update.status = Some(IssueStatus::Todo);
        }
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
