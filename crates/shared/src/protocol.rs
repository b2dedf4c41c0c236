use serde::{Deserialize, Serialize};

use crate::domain::{CommentId, IssueId, IssueStatus, IssueType, ProjectId, SprintId, User};

/// Position of a draggable inside a droppable container, as reported by the
/// drag-and-drop layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraggableLocation {
    pub droppable_id: String,
    pub index: usize,
}

impl DraggableLocation {
    pub fn new(droppable_id: impl Into<String>, index: usize) -> Self {
        Self {
            droppable_id: droppable_id.into(),
            index,
        }
    }
}

/// Result of a finished drag gesture. `destination` is `None` when the drag
/// was cancelled or dropped outside every droppable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragResult {
    pub source: DraggableLocation,
    #[serde(default)]
    pub destination: Option<DraggableLocation>,
}

/// Partial issue update sent for a reorder. Only the order and, for issues
/// moved into a new bucket, the bucket fields are ever written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueForUpdate {
    pub id: IssueId,
    pub board_order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<SprintId>,
}

impl IssueForUpdate {
    pub fn order_only(id: IssueId, board_order: usize) -> Self {
        Self {
            id,
            board_order,
            status: None,
            sprint_id: None,
        }
    }

    pub fn carries_bucket(&self) -> bool {
        self.status.is_some() || self.sprint_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_on_board: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl SprintQuery {
    /// Query pairs in the order the backend documents them.
    pub fn pairs(&self) -> Vec<(&'static str, Vec<String>)> {
        let mut pairs = Vec::new();
        if let Some(active) = self.active {
            pairs.push(("active", vec![active.to_string()]));
        }
        if let Some(display_on_board) = self.display_on_board {
            pairs.push(("displayOnBoard", vec![display_on_board.to_string()]));
        }
        if let Some(project_id) = self.project_id {
            pairs.push(("projectId", vec![project_id.to_string()]));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", vec![search.clone()]));
        }
        pairs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSprint {
    pub goal: String,
    pub active: bool,
    pub display_on_board: bool,
    pub is_backlog: bool,
    pub project_id: ProjectId,
}

impl NewSprint {
    /// Empty active sprint used as planning space next to the backlog.
    pub fn planning(project_id: ProjectId) -> Self {
        Self {
            goal: String::new(),
            active: true,
            display_on_board: false,
            is_backlog: false,
            project_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_on_board: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_on: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub title: String,
    pub status: IssueStatus,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<SprintId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub text: String,
    pub issue_id: IssueId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentUpdate {
    pub id: CommentId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColleagueInvite {
    pub email: String,
}

pub fn user_display_name(user: &User) -> String {
    if !user.full_name.is_empty() {
        return user.full_name.clone();
    }
    let joined = format!("{} {}", user.first_name, user.last_name);
    let joined = joined.trim();
    if joined.is_empty() {
        user.nickname
            .clone()
            .unwrap_or_else(|| format!("user {}", user.id))
    } else {
        joined.to_string()
    }
}

