//! Client-local list buffer for the backlog and board views.

use serde::{Deserialize, Serialize};

use crate::domain::{Issue, IssueStatus, SprintId};

/// The bucket a list stands for. Every issue moved into a list takes on the
/// list's bucket value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BucketValue {
    /// A board column.
    Status(IssueStatus),
    /// A sprint (or the backlog sprint) on the planning view.
    Sprint(SprintId),
}

impl BucketValue {
    /// Writes the bucket into `issue`. Moving into a sprint resets the status
    /// to `todo`.
    pub fn assign(&self, issue: &mut Issue) {
        match *self {
            Self::Status(status) => issue.status = status,
            Self::Sprint(sprint_id) => {
                issue.sprint_id = Some(sprint_id);
                issue.status = IssueStatus::Todo;
            }
        }
    }

    pub fn holds(&self, issue: &Issue) -> bool {
        match *self {
            Self::Status(status) => issue.status == status,
            Self::Sprint(sprint_id) => issue.sprint_id == Some(sprint_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedList {
    pub key: String,
    pub name: String,
    pub bucket: BucketValue,
    pub items: Vec<Issue>,
}

impl OrderedList {
    pub fn new(key: impl Into<String>, bucket: BucketValue, items: Vec<Issue>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            bucket,
            items,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rewrites `board_order` so it matches each item's position.
    pub fn renumber(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.board_order = index;
        }
    }

    pub fn is_contiguous(&self) -> bool {
        self.items
            .iter()
            .enumerate()
            .all(|(index, item)| item.board_order == index)
    }

    pub fn ids(&self) -> Vec<crate::domain::IssueId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

/// Ordered set of lists keyed by `OrderedList::key`. Display order is the
/// order the lists were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListSnapshot {
    lists: Vec<OrderedList>,
}

impl ListSnapshot {
    pub fn new(lists: Vec<OrderedList>) -> Self {
        Self { lists }
    }

    pub fn get(&self, key: &str) -> Option<&OrderedList> {
        self.lists.iter().find(|list| list.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut OrderedList> {
        self.lists.iter_mut().find(|list| list.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderedList> {
        self.lists.iter()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.lists.iter().map(OrderedList::len).sum()
    }

    pub fn into_lists(self) -> Vec<OrderedList> {
        self.lists
    }
}
