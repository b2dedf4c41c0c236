use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use shared::{domain::Issue, protocol::IssueForUpdate};
use tracing::debug;

use crate::reconciler::Batch;

/// Applies a single partial issue update by id.
#[async_trait]
pub trait IssueUpdater: Send + Sync {
    async fn update_issue(&self, update: &IssueForUpdate) -> Result<Issue>;
}

/// Issues every update in `batch` concurrently. Every request runs to
/// completion; the batch fails if any update failed, and updates that did
/// land are not compensated.
pub async fn submit_batch<U>(updater: &U, batch: &Batch) -> Result<Vec<Issue>>
where
    U: IssueUpdater + ?Sized,
{
    debug!(
        list = %batch.list_key,
        updates = batch.len(),
        "submitting order batch"
    );
    join_all(batch.updates.iter().map(|update| updater.update_issue(update)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("failed to persist order for list '{}'", batch.list_key))
}

/// Runs all batches of one move concurrently with each other. Batches never
/// share an issue, so no ordering between them is needed.
pub async fn submit_batches<U>(updater: &U, batches: &[Batch]) -> Result<Vec<Vec<Issue>>>
where
    U: IssueUpdater + ?Sized,
{
    join_all(batches.iter().map(|batch| submit_batch(updater, batch)))
        .await
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use shared::domain::{IssueId, IssueStatus};
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingUpdater {
        seen: Arc<Mutex<Vec<IssueForUpdate>>>,
        fail_id: Option<IssueId>,
    }

    #[async_trait]
    impl IssueUpdater for RecordingUpdater {
        async fn update_issue(&self, update: &IssueForUpdate) -> Result<Issue> {
            self.seen.lock().await.push(update.clone());
            if self.fail_id == Some(update.id) {
                return Err(anyhow!("server rejected issue {}", update.id));
            }
            let mut issue = Issue::new(update.id, IssueStatus::Todo, update.board_order);
            if let Some(status) = update.status {
                issue.status = status;
            }
            Ok(issue)
        }
    }

    fn batch(key: &str, ids: &[i64]) -> Batch {
        Batch {
            list_key: key.to_string(),
            updates: ids
                .iter()
                .enumerate()
                .map(|(order, id)| IssueForUpdate::order_only(IssueId(*id), order))
                .collect(),
        }
    }

    #[tokio::test]
    async fn submits_every_update_of_every_batch() {
        let updater = RecordingUpdater::default();
        let results = submit_batches(&updater, &[batch("todo", &[2]), batch("done", &[3, 1])])
            .await
            .expect("submit");

        assert_eq!(results.len(), 2);
        assert_eq!(results[1][1].id, IssueId(1));
        assert_eq!(results[1][1].board_order, 1);
        assert_eq!(updater.seen.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn one_failed_update_fails_the_move() {
        let updater = RecordingUpdater {
            fail_id: Some(IssueId(3)),
            ..RecordingUpdater::default()
        };
        let err = submit_batches(&updater, &[batch("todo", &[2]), batch("done", &[3, 1])])
            .await
            .expect_err("must fail");

        assert!(err.to_string().contains("'done'"));
        assert!(format!("{err:#}").contains("server rejected issue 3"));
        assert_eq!(updater.seen.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_succeeds_without_requests() {
        let updater = RecordingUpdater::default();
        let results = submit_batch(&updater, &batch("inProgress", &[]))
            .await
            .expect("submit");
        assert!(results.is_empty());
        assert!(updater.seen.lock().await.is_empty());
    }
}
