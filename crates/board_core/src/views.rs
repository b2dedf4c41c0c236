//! Builds the backlog and board list snapshots from fetched sprints.

use shared::{
    domain::{Issue, IssueStatus, Sprint},
    lists::{BucketValue, ListSnapshot, OrderedList},
};

/// Which screen a snapshot feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Backlog,
    Board,
}

pub fn backlog_list_key(sprint: &Sprint) -> String {
    format!("Sprint {}", sprint.id)
}

/// One list per sprint, issues ordered by `board_order`.
pub fn backlog_lists(sprints: Vec<Sprint>) -> ListSnapshot {
    let lists = sprints
        .into_iter()
        .map(|mut sprint| {
            let key = backlog_list_key(&sprint);
            let issues = sorted_by_order(std::mem::take(&mut sprint.issues));
            OrderedList::new(key, BucketValue::Sprint(sprint.id), issues)
        })
        .collect();
    ListSnapshot::new(lists)
}

/// To Do / In Progress / Done columns for the sprint shown on the board.
/// Issues still marked `backlog` have no column.
pub fn board_columns(sprint: &Sprint) -> ListSnapshot {
    let sorted = sorted_by_order(sprint.issues.clone());
    let lists = IssueStatus::BOARD
        .iter()
        .map(|status| {
            let issues = sorted
                .iter()
                .filter(|issue| issue.status == *status)
                .cloned()
                .collect();
            OrderedList::new(status.as_str(), BucketValue::Status(*status), issues)
                .with_name(status.column_name())
        })
        .collect();
    ListSnapshot::new(lists)
}

/// The planning view wants at least one spare sprint besides the backlog and
/// the active sprint.
pub fn needs_planning_sprint(lists: &ListSnapshot) -> bool {
    lists.len() <= 2
}

pub fn format_plural(count: usize, base: &str) -> String {
    if count == 1 {
        base.to_string()
    } else {
        format!("{base}s")
    }
}

fn sorted_by_order(mut issues: Vec<Issue>) -> Vec<Issue> {
    issues.sort_by_key(|issue| issue.board_order);
    issues
}
