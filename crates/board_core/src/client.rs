use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Comment, CommentId, Issue, IssueId, ProjectId, Sprint, SprintId, TeamId, User, UserId},
    error::{ApiError, ApiException, ErrorCode},
    lists::ListSnapshot,
    protocol::{
        ColleagueInvite, CommentUpdate, DeleteResponse, IssueForUpdate, LoginRequest,
        LoginResponse, NewComment, NewIssue, NewSprint, NewUser, SprintQuery, SprintUpdate,
        UserUpdate,
    },
};
use tracing::{debug, info};
use url::Url;

use crate::{
    persistence::IssueUpdater,
    session::SnapshotSource,
    views::{backlog_lists, board_columns, needs_planning_sprint, View},
};

/// Appends `?key=value&...` to `base`. Multi-valued entries are joined with
/// commas; nothing is appended when there are no pairs.
pub fn build_query_string(base: &str, pairs: &[(&str, Vec<String>)]) -> String {
    let query = pairs
        .iter()
        .map(|(key, values)| {
            let value = values
                .iter()
                .map(|value| url::form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>())
                .collect::<Vec<_>>()
                .join(",");
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// Typed REST client for the scrum backend.
#[derive(Debug, Clone)]
pub struct ScrumClient {
    http: Client,
    server_url: String,
    token: Option<String>,
}

impl ScrumClient {
    pub fn new(server_url: impl AsRef<str>) -> Result<Self> {
        Self::with_http(server_url, Client::new())
    }

    pub fn with_timeout(server_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_http(server_url, http)
    }

    fn with_http(server_url: impl AsRef<str>, http: Client) -> Result<Self> {
        let raw = server_url.as_ref().trim();
        let parsed = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("unsupported server url scheme '{}'", parsed.scheme()));
        }
        Ok(Self {
            http,
            server_url: raw.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{path}", self.server_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, path).json(body)).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse> {
        let body: LoginResponse = self
            .send_json(
                Method::POST,
                "/login",
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        info!(email = %body.email, "logged in");
        self.token = Some(body.token.clone());
        Ok(body)
    }

    pub async fn get_issue(&self, issue_id: IssueId) -> Result<Issue> {
        self.send(self.request(Method::GET, &format!("/issues/{issue_id}")))
            .await
    }

    pub async fn add_issue(&self, issue: &NewIssue) -> Result<Issue> {
        self.send_json(Method::POST, "/issues", issue).await
    }

    pub async fn update_issue(&self, update: &IssueForUpdate) -> Result<Issue> {
        self.send_json(Method::PATCH, &format!("/issues/{}", update.id), update)
            .await
    }

    pub async fn get_sprints(&self, query: &SprintQuery) -> Result<Vec<Sprint>> {
        let path = build_query_string("/sprints", &query.pairs());
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn get_backlog_lists(&self, project_id: Option<ProjectId>) -> Result<ListSnapshot> {
        let sprints = self
            .get_sprints(&SprintQuery {
                active: Some(true),
                project_id,
                ..SprintQuery::default()
            })
            .await?;
        Ok(backlog_lists(sprints))
    }

    /// Fetches the backlog, creating a spare planning sprint first when the
    /// project has only the backlog and one active sprint.
    pub async fn get_backlog_lists_with_planning(
        &self,
        project_id: ProjectId,
    ) -> Result<ListSnapshot> {
        let lists = self.get_backlog_lists(Some(project_id)).await?;
        if !needs_planning_sprint(&lists) {
            return Ok(lists);
        }
        let sprint = self.add_sprint(&NewSprint::planning(project_id)).await?;
        info!(sprint_id = %sprint.id, project_id = %project_id, "created planning sprint");
        self.get_backlog_lists(Some(project_id)).await
    }

    pub async fn get_board_sprint(&self) -> Result<Sprint> {
        self.send(self.request(Method::GET, "/sprints/board")).await
    }

    pub async fn get_board_columns(&self) -> Result<ListSnapshot> {
        let sprint = self.get_board_sprint().await?;
        Ok(board_columns(&sprint))
    }

    pub async fn get_sprint(&self, sprint_id: SprintId) -> Result<Sprint> {
        self.send(self.request(Method::GET, &format!("/sprints/{sprint_id}")))
            .await
    }

    pub async fn add_sprint(&self, sprint: &NewSprint) -> Result<Sprint> {
        self.send_json(Method::POST, "/sprints", sprint).await
    }

    pub async fn update_sprint(&self, sprint_id: SprintId, update: &SprintUpdate) -> Result<Sprint> {
        self.send_json(Method::PATCH, &format!("/sprints/{sprint_id}"), update)
            .await
    }

    pub async fn delete_sprint(&self, sprint_id: SprintId) -> Result<DeleteResponse> {
        self.send(self.request(Method::DELETE, &format!("/sprints/{sprint_id}")))
            .await
    }

    pub async fn get_comments(&self) -> Result<Vec<Comment>> {
        self.send(self.request(Method::GET, "/comments")).await
    }

    pub async fn get_comment(&self, comment_id: CommentId) -> Result<Comment> {
        self.send(self.request(Method::GET, &format!("/comments/{comment_id}")))
            .await
    }

    pub async fn add_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.send_json(Method::POST, "/comments", comment).await
    }

    pub async fn update_comment(&self, update: &CommentUpdate) -> Result<Comment> {
        self.send_json(
            Method::PUT,
            &format!("/comments/{}", update.id),
            &serde_json::json!({ "text": update.text }),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<DeleteResponse> {
        self.send(self.request(Method::DELETE, &format!("/comments/{comment_id}")))
            .await
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        self.send(self.request(Method::GET, "/users")).await
    }

    pub async fn get_current_user(&self) -> Result<User> {
        self.send(self.request(Method::GET, "/users/me")).await
    }

    pub async fn add_user(&self, user: &NewUser) -> Result<User> {
        self.send_json(Method::POST, "/users", user).await
    }

    pub async fn update_user(&self, user_id: UserId, update: &UserUpdate) -> Result<User> {
        self.send_json(Method::PUT, &format!("/users/{user_id}"), update)
            .await
    }

    pub async fn add_colleague(&self, email: &str) -> Result<User> {
        self.send_json(
            Method::POST,
            "/users/colleagues",
            &ColleagueInvite {
                email: email.to_string(),
            },
        )
        .await
    }

    pub async fn delete_team(&self, team_id: TeamId) -> Result<DeleteResponse> {
        self.send(self.request(Method::DELETE, &format!("/teams/{team_id}")))
            .await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .with_context(|| format!("malformed response body (status {status})"));
    }

    let body = response.text().await.unwrap_or_default();
    let exception = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => ApiException::from(api_error),
        Err(_) => ApiException::new(
            ErrorCode::from_status(status.as_u16()),
            if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        ),
    };
    debug!(%status, error = %exception, "request rejected");
    Err(exception.into())
}

#[async_trait]
impl IssueUpdater for ScrumClient {
    async fn update_issue(&self, update: &IssueForUpdate) -> Result<Issue> {
        ScrumClient::update_issue(self, update).await
    }
}

/// Reloads one view's lists from the backend.
pub struct RemoteSnapshot {
    client: Arc<ScrumClient>,
    view: View,
    project_id: Option<ProjectId>,
}

impl RemoteSnapshot {
    pub fn new(client: Arc<ScrumClient>, view: View, project_id: Option<ProjectId>) -> Self {
        Self {
            client,
            view,
            project_id,
        }
    }
}

#[async_trait]
impl SnapshotSource for RemoteSnapshot {
    async fn fetch_snapshot(&self) -> Result<ListSnapshot> {
        match self.view {
            View::Backlog => self.client.get_backlog_lists(self.project_id).await,
            View::Board => self.client.get_board_columns().await,
        }
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
