use super::*;
use shared::{
    domain::{Issue, IssueStatus, SprintId},
    protocol::DraggableLocation,
};
use std::collections::BTreeSet;

fn issue(id: i64, status: IssueStatus, order: usize) -> Issue {
    Issue::new(IssueId(id), status, order).with_title(format!("issue {id}"))
}

fn column(status: IssueStatus, ids: &[i64]) -> OrderedList {
    OrderedList::new(
        status.as_str(),
        BucketValue::Status(status),
        ids.iter()
            .enumerate()
            .map(|(order, id)| issue(*id, status, order))
            .collect(),
    )
}

fn board() -> ListSnapshot {
    ListSnapshot::new(vec![
        column(IssueStatus::Todo, &[1, 2]),
        column(IssueStatus::InProgress, &[]),
        column(IssueStatus::Done, &[3]),
    ])
}

fn ids(snapshot: &ListSnapshot, key: &str) -> Vec<i64> {
    snapshot
        .get(key)
        .expect("list")
        .items
        .iter()
        .map(|item| item.id.0)
        .collect()
}

#[test]
fn cross_list_scenario_from_todo_to_done() {
    let before = board();
    let result = reconcile_move(&before, &Move::new("todo", 0, "done", 1)).expect("reconcile");

    let todo = result.snapshot.get("todo").expect("todo");
    assert_eq!(todo.items.len(), 1);
    assert_eq!(todo.items[0].id, IssueId(2));
    assert_eq!(todo.items[0].board_order, 0);

    let done = result.snapshot.get("done").expect("done");
    assert_eq!(ids(&result.snapshot, "done"), vec![3, 1]);
    assert_eq!(done.items[1].board_order, 1);
    assert_eq!(done.items[1].status, IssueStatus::Done);

    assert_eq!(
        result.batches,
        vec![
            Batch {
                list_key: "todo".into(),
                updates: vec![IssueForUpdate::order_only(IssueId(2), 0)],
            },
            Batch {
                list_key: "done".into(),
                updates: vec![
                    IssueForUpdate::order_only(IssueId(3), 0),
                    IssueForUpdate {
                        id: IssueId(1),
                        board_order: 1,
                        status: Some(IssueStatus::Done),
                        sprint_id: None,
                    },
                ],
            },
        ]
    );
}

#[test]
fn within_list_reorder_keeps_membership_for_every_index_pair() {
    let list = column(IssueStatus::Todo, &[10, 11, 12, 13, 14]);
    let snapshot = ListSnapshot::new(vec![list.clone()]);
    let original: BTreeSet<_> = list.ids().into_iter().collect();

    for from in 0..list.len() {
        for to in 0..list.len() {
            let result = reconcile_move(&snapshot, &Move::new("todo", from, "todo", to))
                .expect("reconcile");
            let after = result.snapshot.get("todo").expect("todo");

            let members: BTreeSet<_> = after.ids().into_iter().collect();
            assert_eq!(members, original);
            assert_eq!(after.items[to].id, list.items[from].id);
            assert!(after.is_contiguous());

            for (new_pos, item) in after.items.iter().enumerate() {
                let old_pos = list.ids().iter().position(|id| *id == item.id).expect("pos");
                assert!(old_pos.abs_diff(new_pos) <= 1 || item.id == list.items[from].id);
            }

            assert_eq!(result.batches.len(), 1);
            assert_eq!(result.batches[0].len(), list.len());
            assert!(result.batches[0].updates.iter().all(|u| !u.carries_bucket()));
        }
    }
}

#[test]
fn cross_list_move_changes_only_moved_bucket() {
    let before = board();
    let result =
        reconcile_move(&before, &Move::new("todo", 1, "inProgress", 0)).expect("reconcile");

    for list in result.snapshot.iter() {
        assert!(list.is_contiguous(), "list {} not contiguous", list.key);
        for item in &list.items {
            assert!(list.bucket.holds(item), "item {} in wrong bucket", item.id);
        }
    }

    let moved = &result.snapshot.get("inProgress").expect("list").items[0];
    assert_eq!(moved.id, IssueId(2));
    assert_eq!(moved.status, IssueStatus::InProgress);
    assert_eq!(moved.title.as_deref(), Some("issue 2"));

    let untouched = &result.snapshot.get("todo").expect("list").items[0];
    assert_eq!(untouched.status, IssueStatus::Todo);

    let bucket_entries: Vec<_> = result
        .batches
        .iter()
        .flat_map(|batch| batch.updates.iter())
        .filter(|update| update.carries_bucket())
        .collect();
    assert_eq!(bucket_entries.len(), 1);
    assert_eq!(bucket_entries[0].id, IssueId(2));
}

#[test]
fn cross_list_move_neither_duplicates_nor_loses_items() {
    let before = board();
    let union = |snapshot: &ListSnapshot| -> BTreeSet<i64> {
        ids(snapshot, "todo")
            .into_iter()
            .chain(ids(snapshot, "done"))
            .collect()
    };
    let result = reconcile_move(&before, &Move::new("done", 0, "todo", 2)).expect("reconcile");

    assert_eq!(union(&before), union(&result.snapshot));
    assert_eq!(result.snapshot.item_count(), before.item_count());
    assert_eq!(ids(&result.snapshot, "todo"), vec![1, 2, 3]);
    assert!(result.snapshot.get("done").expect("done").is_empty());
}

#[test]
fn cross_list_batches_cover_both_lists_after_move() {
    let before = board();
    let result = reconcile_move(&before, &Move::new("todo", 0, "done", 0)).expect("reconcile");
    let sizes: usize = ["todo", "done"]
        .iter()
        .map(|key| result.snapshot.get(key).expect("list").len())
        .sum();
    assert_eq!(result.update_count(), sizes);
    assert_eq!(result.batches[0].list_key, "todo");
    assert_eq!(result.batches[1].list_key, "done");
}

#[test]
fn moving_into_empty_column_and_emptying_source() {
    let snapshot = ListSnapshot::new(vec![
        column(IssueStatus::Todo, &[7]),
        column(IssueStatus::Done, &[]),
    ]);
    let result = reconcile_move(&snapshot, &Move::new("todo", 0, "done", 0)).expect("reconcile");
    assert!(result.batches[0].is_empty());
    assert_eq!(result.batches[1].updates[0].status, Some(IssueStatus::Done));
}

#[test]
fn sprint_move_writes_sprint_and_resets_status() {
    let mut in_progress = Issue::new(IssueId(5), IssueStatus::InProgress, 0);
    in_progress.sprint_id = Some(SprintId(1));
    let snapshot = ListSnapshot::new(vec![
        OrderedList::new("Sprint 1", BucketValue::Sprint(SprintId(1)), vec![in_progress]),
        OrderedList::new("Sprint 2", BucketValue::Sprint(SprintId(2)), Vec::new()),
    ]);

    let result =
        reconcile_move(&snapshot, &Move::new("Sprint 1", 0, "Sprint 2", 0)).expect("reconcile");
    let moved = &result.snapshot.get("Sprint 2").expect("list").items[0];
    assert_eq!(moved.sprint_id, Some(SprintId(2)));
    assert_eq!(moved.status, IssueStatus::Todo);
    assert_eq!(
        result.batches[1].updates,
        vec![IssueForUpdate {
            id: IssueId(5),
            board_order: 0,
            status: Some(IssueStatus::Todo),
            sprint_id: Some(SprintId(2)),
        }]
    );
}

#[test]
fn same_list_index_at_length_appends() {
    let before = board();
    let result = reconcile_move(&before, &Move::new("todo", 0, "todo", 2)).expect("reconcile");
    assert_eq!(ids(&result.snapshot, "todo"), vec![2, 1]);
    assert!(result.snapshot.get("todo").expect("todo").is_contiguous());
    assert_eq!(
        result.batches[0].updates,
        vec![
            IssueForUpdate::order_only(IssueId(2), 0),
            IssueForUpdate::order_only(IssueId(1), 1),
        ]
    );
}

#[test]
fn no_op_move_still_emits_full_batch() {
    let before = board();
    let result = reconcile_move(&before, &Move::new("todo", 1, "todo", 1)).expect("reconcile");
    assert_eq!(result.snapshot, before);
    assert_eq!(
        result.batches,
        vec![Batch {
            list_key: "todo".into(),
            updates: vec![
                IssueForUpdate::order_only(IssueId(1), 0),
                IssueForUpdate::order_only(IssueId(2), 1),
            ],
        }]
    );
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let before = board();
    let mv = Move::new("todo", 0, "done", 0);
    assert_eq!(
        reconcile_move(&before, &mv).expect("first"),
        reconcile_move(&before, &mv).expect("second")
    );
}

#[test]
fn cancelled_drag_yields_no_move() {
    let result = DragResult {
        source: DraggableLocation::new("todo", 0),
        destination: None,
    };
    assert_eq!(Move::from_drag(&result), None);

    let dropped = DragResult {
        source: DraggableLocation::new("todo", 0),
        destination: Some(DraggableLocation::new("done", 1)),
    };
    assert_eq!(
        Move::from_drag(&dropped),
        Some(Move::new("todo", 0, "done", 1))
    );
}

#[test]
fn rejects_out_of_range_and_unknown_lists() {
    let before = board();
    assert_eq!(
        reconcile_move(&before, &Move::new("todo", 2, "done", 0)),
        Err(ReconcileError::SourceIndexOutOfRange {
            key: "todo".into(),
            index: 2,
            len: 2,
        })
    );
    assert_eq!(
        reconcile_move(&before, &Move::new("todo", 0, "done", 2)),
        Err(ReconcileError::DestinationIndexOutOfRange {
            key: "done".into(),
            index: 2,
            max: 1,
        })
    );
    assert_eq!(
        reconcile_move(&before, &Move::new("todo", 0, "todo", 3)),
        Err(ReconcileError::DestinationIndexOutOfRange {
            key: "todo".into(),
            index: 3,
            max: 2,
        })
    );
    assert_eq!(
        reconcile_move(&before, &Move::new("todo", 0, "review", 0)),
        Err(ReconcileError::UnknownList("review".into()))
    );
    assert_eq!(
        reconcile_move(&ListSnapshot::default(), &Move::new("todo", 0, "todo", 0)),
        Err(ReconcileError::UnknownList("todo".into()))
    );
}
