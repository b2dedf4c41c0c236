use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(IssueId);
id_newtype!(SprintId);
id_newtype!(ProjectId);
id_newtype!(CommentId);
id_newtype!(TeamId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueStatus {
    Backlog,
    #[default]
    Todo,
    InProgress,
    Done,
}

impl IssueStatus {
    /// Statuses that have a column on the board, in display order.
    pub const BOARD: [IssueStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Done => "done",
        }
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "backlog" => Some(Self::Backlog),
            "todo" => Some(Self::Todo),
            "inProgress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueType {
    UserStory,
    Bug,
    #[default]
    Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

/// A unit of work. Fields the client does not model are kept in `extra`
/// and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: IssueStatus,
    #[serde(default)]
    pub sprint_id: Option<SprintId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub board_order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub issue_type: IssueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issue {
    pub fn new(id: IssueId, status: IssueStatus, board_order: usize) -> Self {
        Self {
            id,
            status,
            sprint_id: None,
            board_order,
            title: None,
            description: None,
            issue_type: IssueType::default(),
            story_points: None,
            assignee: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn comment_count(&self) -> usize {
        self.extra
            .get("comments")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: SprintId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub goal: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_on_board: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_backlog: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<IssueId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_keeps_unknown_fields() {
        let raw = json!({
            "id": 12,
            "status": "inProgress",
            "sprintId": 3,
            "boardOrder": 1,
            "title": "Wire up login",
            "type": "bug",
            "comments": [{"id": 1}, {"id": 2}],
            "attachmentUri": "s3://bucket/a.png"
        });
        let issue: Issue = serde_json::from_value(raw.clone()).expect("decode");
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.issue_type, IssueType::Bug);
        assert_eq!(issue.comment_count(), 2);

        let encoded = serde_json::to_value(&issue).expect("encode");
        assert_eq!(encoded["attachmentUri"], raw["attachmentUri"]);
        assert_eq!(encoded["comments"], raw["comments"]);
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let sprint: Sprint = serde_json::from_value(json!({
            "id": 3,
            "goal": null,
            "active": null,
            "issues": [
                {"id": 1, "status": null, "boardOrder": null, "type": null},
                {"id": 2, "status": "done", "boardOrder": 4}
            ]
        }))
        .expect("decode");

        assert_eq!(sprint.goal, "");
        assert!(!sprint.active);
        assert_eq!(sprint.issues[0].status, IssueStatus::Todo);
        assert_eq!(sprint.issues[0].board_order, 0);
        assert_eq!(sprint.issues[0].issue_type, IssueType::Task);
        assert_eq!(sprint.issues[1].board_order, 4);

        let sprint: Sprint =
            serde_json::from_value(json!({"id": 4, "issues": null})).expect("decode");
        assert!(sprint.issues.is_empty());
    }

    #[test]
    fn status_wire_names_round_trip_through_parse() {
        for status in IssueStatus::BOARD {
            assert_eq!(IssueStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(IssueStatus::parse("blocked"), None);
    }
}
