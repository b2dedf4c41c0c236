use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use board_core::{
    format_plural, load_settings, BoardEvent, BoardSession, ClientSettings, FailurePolicy,
    MoveOutcome, RemoteSnapshot, ScrumClient, View,
};
use clap::{Parser, Subcommand, ValueEnum};
use shared::{
    domain::{IssueId, ProjectId},
    lists::ListSnapshot,
    protocol::{user_display_name, DragResult, DraggableLocation, NewComment},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scrum", about = "Scrum board client")]
struct Cli {
    /// Overrides `api_url` from scrum.toml / SCRUM_API_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, env = "SCRUM_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(long, value_enum)]
    on_failure: Option<PolicyArg>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Notify,
    Refetch,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Notify => Self::Notify,
            PolicyArg::Refetch => Self::Refetch,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewArg {
    Backlog,
    Board,
}

impl From<ViewArg> for View {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Backlog => Self::Backlog,
            ViewArg::Board => Self::Board,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Backlog {
        #[arg(long)]
        project_id: i64,
    },
    Board,
    /// Moves one issue and persists the new order.
    Move {
        #[arg(long, value_enum)]
        view: ViewArg,
        #[arg(long)]
        project_id: Option<i64>,
        #[arg(long)]
        from: String,
        #[arg(long)]
        from_index: usize,
        /// Omit to simulate a cancelled drag.
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        to_index: Option<usize>,
    },
    /// Applies a drag result given as JSON, e.g. from a recorded gesture.
    ApplyDrag {
        #[arg(long, value_enum)]
        view: ViewArg,
        #[arg(long)]
        project_id: Option<i64>,
        result: String,
    },
    Users,
    Comment {
        #[arg(long)]
        issue_id: i64,
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    apply_overrides(&mut settings, &cli);
    debug!(api_url = %settings.api_url, policy = %settings.failure_policy, "settings loaded");
    let mut client = settings.build_client()?;

    match cli.command {
        Command::Login { email, password } => {
            let res = client.login(&email, &password).await?;
            println!("Logged in as {} <{}>", res.name, res.email);
            println!("token={}", res.token);
        }
        Command::Backlog { project_id } => {
            let lists = client
                .get_backlog_lists_with_planning(ProjectId(project_id))
                .await?;
            print_lists(&lists);
        }
        Command::Board => {
            let lists = client.get_board_columns().await?;
            print_lists(&lists);
        }
        Command::Move {
            view,
            project_id,
            from,
            from_index,
            to,
            to_index,
        } => {
            let destination = match (to, to_index) {
                (Some(key), Some(index)) => Some(DraggableLocation::new(key, index)),
                (None, None) => None,
                _ => return Err(anyhow!("--to and --to-index must be given together")),
            };
            let result = DragResult {
                source: DraggableLocation::new(from, from_index),
                destination,
            };
            run_drag(client, &settings, view.into(), project_id, result).await?;
        }
        Command::ApplyDrag {
            view,
            project_id,
            result,
        } => {
            let result: DragResult =
                serde_json::from_str(&result).context("invalid drag result json")?;
            run_drag(client, &settings, view.into(), project_id, result).await?;
        }
        Command::Users => {
            let users = client.get_users().await?;
            println!("{} {}", users.len(), format_plural(users.len(), "user"));
            for user in users {
                println!("  {:>4}  {}  <{}>", user.id.0, user_display_name(&user), user.email);
            }
        }
        Command::Comment { issue_id, text } => {
            let comment = client
                .add_comment(&NewComment {
                    text,
                    issue_id: IssueId(issue_id),
                })
                .await?;
            println!("created comment_id={}", comment.id);
        }
    }

    Ok(())
}

fn apply_overrides(settings: &mut ClientSettings, cli: &Cli) {
    if let Some(url) = &cli.server_url {
        settings.api_url = url.clone();
    }
    if cli.token.is_some() {
        settings.token = cli.token.clone();
    }
    if let Some(policy) = cli.on_failure {
        settings.failure_policy = policy.into();
    }
}

async fn run_drag(
    client: ScrumClient,
    settings: &ClientSettings,
    view: View,
    project_id: Option<i64>,
    result: DragResult,
) -> Result<()> {
    let client = Arc::new(client);
    let source = Arc::new(RemoteSnapshot::new(
        client.clone(),
        view,
        project_id.map(ProjectId),
    ));
    let session = BoardSession::new(client, settings.failure_policy).with_source(source);
    session.refetch().await.context("failed to load lists")?;
    let mut events = session.subscribe_events();

    session.drag_started().await;
    let outcome = session.drag_ended(&result).await?;

    while let Ok(event) = events.try_recv() {
        if let BoardEvent::Notification(notification) = event {
            eprintln!("{}: {}", notification.title, notification.message);
        }
    }

    match outcome {
        MoveOutcome::Cancelled => println!("drag cancelled; nothing changed"),
        MoveOutcome::Persisted { batches, updates } => {
            info!(batches, updates, "move saved");
        }
        MoveOutcome::PersistFailed { refetched } => {
            if refetched {
                println!("reloaded lists from server");
            }
        }
    }
    print_lists(&session.snapshot().await);
    Ok(())
}

fn print_lists(lists: &ListSnapshot) {
    for list in lists.iter() {
        println!(
            "{} [{}] ({} {})",
            list.name,
            list.key,
            list.len(),
            format_plural(list.len(), "issue")
        );
        for issue in &list.items {
            println!(
                "  {:>3}. #{:<5} {:<11} {}",
                issue.board_order,
                issue.id.0,
                issue.status.as_str(),
                issue.title.as_deref().unwrap_or("(untitled)")
            );
        }
    }
}
