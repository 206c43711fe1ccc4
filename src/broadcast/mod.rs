//! Broadcast fan-out.
//!
//! Delivers one message to every registered recipient in fixed-size
//! pages. The persisted job record is the source of truth for
//! cancellation: the runner re-reads it before each page, so a cancel
//! request takes effect at page granularity and at most one page of
//! sends can land after it. Per-recipient failures are counted, never
//! retried, and never abort the page.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::database::models::BroadcastStatus;

/// Pages of recipient user ids, ordered stably.
///
/// An empty page is terminal; a fetch error is not silently treated as
/// "done" and instead aborts the run.
#[async_trait]
pub trait RecipientSource: Send + Sync {
    async fn page(&self, limit: u32, offset: u64) -> Result<Vec<u64>>;
}

/// Delivers the broadcast message to a single recipient.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, user_id: u64, header: &str, body: &str) -> Result<()>;
}

/// Persisted job state: cancellation reads and progress checkpoints.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn status(&self, job_id: i64) -> Result<BroadcastStatus>;
    async fn checkpoint(
        &self,
        job_id: i64,
        sent: u32,
        failed: u32,
        status: BroadcastStatus,
    ) -> Result<()>;
}

#[async_trait]
impl<T: RecipientSource + ?Sized> RecipientSource for std::sync::Arc<T> {
    async fn page(&self, limit: u32, offset: u64) -> Result<Vec<u64>> {
        (**self).page(limit, offset).await
    }
}

#[async_trait]
impl<T: DeliverySink + ?Sized> DeliverySink for std::sync::Arc<T> {
    async fn deliver(&self, user_id: u64, header: &str, body: &str) -> Result<()> {
        (**self).deliver(user_id, header, body).await
    }
}

#[async_trait]
impl<T: JobStore + ?Sized> JobStore for std::sync::Arc<T> {
    async fn status(&self, job_id: i64) -> Result<BroadcastStatus> {
        (**self).status(job_id).await
    }

    async fn checkpoint(
        &self,
        job_id: i64,
        sent: u32,
        failed: u32,
        status: BroadcastStatus,
    ) -> Result<()> {
        (**self).checkpoint(job_id, sent, failed, status).await
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub status: BroadcastStatus,
    pub sent: u32,
    pub failed: u32,
}

pub struct BroadcastRunner<R, D, S> {
    recipients: R,
    sink: D,
    store: S,
    page_size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 100;

impl<R, D, S> BroadcastRunner<R, D, S>
where
    R: RecipientSource,
    D: DeliverySink,
    S: JobStore,
{
    pub fn new(recipients: R, sink: D, store: S, page_size: u32) -> Self {
        Self {
            recipients,
            sink,
            store,
            page_size: page_size.max(1),
        }
    }

    /// Run the fan-out to completion, cancellation, or fetch error.
    ///
    /// `sent + failed` equals the number of recipients processed at every
    /// checkpoint; counts never move after cancellation is observed.
    pub async fn run(&self, job_id: i64, header: &str, body: &str) -> Result<BroadcastOutcome> {
        let mut sent = 0u32;
        let mut failed = 0u32;
        let mut offset = 0u64;

        loop {
            if self.store.status(job_id).await? == BroadcastStatus::Cancelled {
                info!(
                    "Broadcast {} cancelled after {} sent / {} failed",
                    job_id, sent, failed
                );
                self.store
                    .checkpoint(job_id, sent, failed, BroadcastStatus::Cancelled)
                    .await?;
                return Ok(BroadcastOutcome {
                    status: BroadcastStatus::Cancelled,
                    sent,
                    failed,
                });
            }

            let page = self.recipients.page(self.page_size, offset).await?;
            if page.is_empty() {
                self.store
                    .checkpoint(job_id, sent, failed, BroadcastStatus::Completed)
                    .await?;
                info!(
                    "Broadcast {} completed: {} sent, {} failed",
                    job_id, sent, failed
                );
                return Ok(BroadcastOutcome {
                    status: BroadcastStatus::Completed,
                    sent,
                    failed,
                });
            }

            for user_id in &page {
                match self.sink.deliver(*user_id, header, body).await {
                    Ok(()) => sent += 1,
                    Err(e) => {
                        failed += 1;
                        debug!("Broadcast {} delivery to {} failed: {:#}", job_id, user_id, e);
                    }
                }
            }

            offset += page.len() as u64;
            self.store
                .checkpoint(job_id, sent, failed, BroadcastStatus::Sending)
                .await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    struct FixedRecipients {
        ids: Vec<u64>,
    }

    #[async_trait]
    impl RecipientSource for FixedRecipients {
        async fn page(&self, limit: u32, offset: u64) -> Result<Vec<u64>> {
            let start = (offset as usize).min(self.ids.len());
            let end = (start + limit as usize).min(self.ids.len());
            Ok(self.ids[start..end].to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<u64>>,
        /// Recipients whose delivery fails.
        failing: Vec<u64>,
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&self, user_id: u64, _header: &str, _body: &str) -> Result<()> {
            if self.failing.contains(&user_id) {
                anyhow::bail!("blocked by user");
            }
            self.delivered.lock().push(user_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        checkpoints: Mutex<Vec<(u32, u32, BroadcastStatus)>>,
        /// Flip the job to cancelled once this many checkpoints exist.
        cancel_after_checkpoints: Option<usize>,
    }

    #[async_trait]
    impl JobStore for MemoryStore {
        async fn status(&self, _job_id: i64) -> Result<BroadcastStatus> {
            let cps = self.checkpoints.lock();
            if let Some(n) = self.cancel_after_checkpoints {
                if cps.len() >= n {
                    return Ok(BroadcastStatus::Cancelled);
                }
            }
            Ok(cps
                .last()
                .map(|(_, _, s)| *s)
                .unwrap_or(BroadcastStatus::Pending))
        }

        async fn checkpoint(
            &self,
            _job_id: i64,
            sent: u32,
            failed: u32,
            status: BroadcastStatus,
        ) -> Result<()> {
            self.checkpoints.lock().push((sent, failed, status));
            Ok(())
        }
    }

    fn runner(
        total: u64,
        failing: Vec<u64>,
        cancel_after: Option<usize>,
    ) -> BroadcastRunner<FixedRecipients, RecordingSink, MemoryStore> {
        BroadcastRunner::new(
            FixedRecipients {
                ids: (1..=total).collect(),
            },
            RecordingSink {
                delivered: Mutex::new(Vec::new()),
                failing,
            },
            MemoryStore {
                checkpoints: Mutex::new(Vec::new()),
                cancel_after_checkpoints: cancel_after,
            },
            100,
        )
    }

    #[tokio::test]
    async fn test_250_recipients_three_progress_checkpoints() {
        let r = runner(250, vec![], None);
        let outcome = r.run(1, "Hello", "World").await.unwrap();

        assert_eq!(outcome.status, BroadcastStatus::Completed);
        assert_eq!(outcome.sent + outcome.failed, 250);

        let cps = r.store.checkpoints.lock();
        let sending: Vec<_> = cps
            .iter()
            .filter(|(_, _, s)| *s == BroadcastStatus::Sending)
            .collect();
        assert_eq!(sending.len(), 3);
        // sent+failed is non-decreasing across checkpoints.
        let mut prev = 0;
        for (sent, failed, _) in cps.iter() {
            assert!(sent + failed >= prev);
            prev = sent + failed;
        }
        assert_eq!(cps.last().unwrap().2, BroadcastStatus::Completed);
        assert_eq!(cps.last().unwrap().0, 250);
    }

    #[tokio::test]
    async fn test_per_recipient_failure_does_not_abort_page() {
        let r = runner(150, vec![7, 42, 120], None);
        let outcome = r.run(2, "h", "b").await.unwrap();

        assert_eq!(outcome.status, BroadcastStatus::Completed);
        assert_eq!(outcome.sent, 147);
        assert_eq!(outcome.failed, 3);
        assert_eq!(r.sink.delivered.lock().len(), 147);
    }

    #[tokio::test]
    async fn test_cancellation_observed_at_page_boundary() {
        // Cancel becomes visible once the first page checkpoint exists.
        let r = runner(250, vec![], Some(1));
        let outcome = r.run(3, "h", "b").await.unwrap();

        assert_eq!(outcome.status, BroadcastStatus::Cancelled);
        // Exactly one page went out before the cancel was observed.
        assert_eq!(outcome.sent, 100);
        assert_eq!(r.sink.delivered.lock().len(), 100);

        let cps = r.store.checkpoints.lock();
        let (sent, failed, status) = *cps.last().unwrap();
        assert_eq!(status, BroadcastStatus::Cancelled);
        assert_eq!(sent + failed, 100);
    }

    #[tokio::test]
    async fn test_empty_recipient_set_completes_immediately() {
        let r = runner(0, vec![], None);
        let outcome = r.run(4, "h", "b").await.unwrap();

        assert_eq!(outcome.status, BroadcastStatus::Completed);
        assert_eq!(outcome.sent, 0);
        let cps = r.store.checkpoints.lock();
        assert_eq!(cps.len(), 1);
        assert_eq!(cps[0].2, BroadcastStatus::Completed);
    }

    struct FailingRecipients;

    #[async_trait]
    impl RecipientSource for FailingRecipients {
        async fn page(&self, _limit: u32, _offset: u64) -> Result<Vec<u64>> {
            anyhow::bail!("cursor lost")
        }
    }

    #[tokio::test]
    async fn test_page_fetch_error_is_not_completion() {
        let runner = BroadcastRunner::new(
            FailingRecipients,
            RecordingSink::default(),
            MemoryStore::default(),
            100,
        );
        assert!(runner.run(5, "h", "b").await.is_err());
        // No terminal status was persisted.
        assert!(runner.store.checkpoints.lock().is_empty());
    }
}
