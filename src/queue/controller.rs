use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::busy::{BusyFlag, BusyGuard};
use crate::job::JobId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is full, please try later")]
    Full,

    #[error("Download worker is not running")]
    Closed,
}

/// JobQueue is the submission side of the download pipeline
///
/// Architecture:
/// 1. HTTP handlers call `queue.submit(id)`
/// 2. The id lands in a bounded mpsc channel (FIFO)
/// 3. The single download worker owns the matching [`JobReceiver`]
/// 4. A full channel rejects the submission immediately, it never waits
///
/// There is no job table. Besides the channel slots, the only shared state
/// is the [`BusyFlag`] the worker raises while it handles a job.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<JobId>,
    busy: BusyFlag,
}

/// Receiving half of the queue, owned by the download worker.
pub struct JobReceiver {
    rx: mpsc::Receiver<JobId>,
    busy: BusyFlag,
}

/// A job taken off the queue.
///
/// The worker stays marked busy until this is dropped, so a job that has
/// left its channel slot is never reported as missing.
#[derive(Debug)]
pub struct Dequeued {
    id: JobId,
    _busy: BusyGuard,
}

impl Dequeued {
    pub fn id(&self) -> &JobId {
        &self.id
    }
}

impl JobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    ///
    /// A capacity of zero is bumped to one; config validation rejects it
    /// before it gets here.
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let capacity = capacity.max(1);
        info!(capacity, "Creating job queue");

        let (tx, rx) = mpsc::channel(capacity);
        let busy = BusyFlag::new();

        let queue = Self {
            tx,
            busy: busy.clone(),
        };
        (queue, JobReceiver { rx, busy })
    }

    /// Enqueue a job without waiting for room.
    pub fn submit(&self, id: JobId) -> Result<(), QueueError> {
        match self.tx.try_send(id) {
            Ok(()) => {
                debug!(depth = self.queue_depth(), "Job queued");
                Ok(())
            }
            Err(TrySendError::Full(id)) => {
                warn!(job_id = %id, "Queue full, rejecting job");
                Err(QueueError::Full)
            }
            Err(TrySendError::Closed(id)) => {
                warn!(job_id = %id, "Worker gone, rejecting job");
                Err(QueueError::Closed)
            }
        }
    }

    /// Number of jobs waiting to be picked up by the worker.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn is_worker_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> &BusyFlag {
        &self.busy
    }

    /// Check that the worker side is still attached
    pub fn health_check(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl JobReceiver {
    /// Wait for the next job; `None` once every [`JobQueue`] handle is gone.
    ///
    /// The busy flag is raised before the job is handed out.
    pub async fn recv(&mut self) -> Option<Dequeued> {
        let id = self.rx.recv().await?;
        let busy = self.busy.mark_busy();
        Some(Dequeued { id, _busy: busy })
    }

    pub fn busy_flag(&self) -> &BusyFlag {
        &self.busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> JobId {
        JobId::parse(raw).unwrap()
    }

    async fn next_id(receiver: &mut JobReceiver) -> Option<JobId> {
        receiver.recv().await.map(|job| job.id().clone())
    }

    #[tokio::test]
    async fn test_submit_rejects_when_full() {
        let (queue, mut receiver) = JobQueue::new(2);

        assert_eq!(queue.submit(id("abc123")), Ok(()));
        assert_eq!(queue.submit(id("def456")), Ok(()));
        assert_eq!(queue.submit(id("ghi789")), Err(QueueError::Full));
        assert_eq!(queue.queue_depth(), 2);

        // Worker drains one slot
        assert_eq!(next_id(&mut receiver).await, Some(id("abc123")));
        assert_eq!(queue.queue_depth(), 1);

        assert_eq!(queue.submit(id("jkl012")), Ok(()));
        assert_eq!(queue.queue_depth(), 2);
    }

    #[tokio::test]
    async fn test_fifo_order_and_duplicates() {
        let (queue, mut receiver) = JobQueue::new(4);

        queue.submit(id("first")).unwrap();
        queue.submit(id("second")).unwrap();
        queue.submit(id("first")).unwrap();

        assert_eq!(next_id(&mut receiver).await, Some(id("first")));
        assert_eq!(next_id(&mut receiver).await, Some(id("second")));
        assert_eq!(next_id(&mut receiver).await, Some(id("first")));
        assert_eq!(queue.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_submit_after_worker_gone() {
        let (queue, receiver) = JobQueue::new(2);
        drop(receiver);

        assert!(!queue.health_check());
        assert_eq!(queue.submit(id("abc123")), Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn test_receiver_ends_when_queue_dropped() {
        let (queue, mut receiver) = JobQueue::new(2);
        queue.submit(id("abc123")).unwrap();
        drop(queue);

        assert_eq!(next_id(&mut receiver).await, Some(id("abc123")));
        assert_eq!(next_id(&mut receiver).await, None);
    }

    #[test]
    fn test_busy_flag_shared_with_receiver() {
        let (queue, receiver) = JobQueue::new(1);
        assert!(!queue.is_worker_busy());

        let guard = receiver.busy_flag().mark_busy();
        assert!(queue.is_worker_busy());
        drop(guard);
        assert!(!queue.is_worker_busy());
    }

    #[tokio::test]
    async fn test_dequeued_job_keeps_worker_busy() {
        let (queue, mut receiver) = JobQueue::new(2);
        queue.submit(id("abc123")).unwrap();

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.id(), &id("abc123"));
        assert_eq!(queue.queue_depth(), 0);
        assert!(queue.is_worker_busy());

        drop(job);
        assert!(!queue.is_worker_busy());
    }

    #[tokio::test]
    async fn test_closed_queue_leaves_worker_idle() {
        let (queue, mut receiver) = JobQueue::new(2);
        drop(queue);

        assert!(receiver.recv().await.is_none());
        assert!(!receiver.busy_flag().is_busy());
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let (queue, _receiver) = JobQueue::new(0);
        assert_eq!(queue.capacity(), 1);
    }
}
