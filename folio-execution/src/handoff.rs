//! In-process handoff between `begin` and `complete`
//!
//! [`QueueHandoff`] pushes job ids onto a bounded channel. An
//! [`ExecutionWorker`] drains the channel and runs `complete` for each job,
//! with at most `max_concurrent` jobs in flight. Delivery is at most once: a
//! job whose message is lost stays `Accepted` until
//! [`LifecycleEngine::recover`](crate::LifecycleEngine::recover) runs.

use crate::lifecycle::LifecycleEngine;
use async_trait::async_trait;
use folio_core::{FolioError, FolioResult, JobId};
use folio_interfaces::TaskHandoff;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Sending half of the execution queue
#[derive(Debug, Clone)]
pub struct QueueHandoff {
    sender: mpsc::Sender<JobId>,
}

/// Receiving half of the execution queue
#[derive(Debug)]
pub struct JobQueue {
    receiver: mpsc::Receiver<JobId>,
}

impl QueueHandoff {
    /// Create a queue holding at most `capacity` pending jobs
    pub fn channel(capacity: usize) -> (QueueHandoff, JobQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (QueueHandoff { sender }, JobQueue { receiver })
    }
}

#[async_trait]
impl TaskHandoff for QueueHandoff {
    async fn submit(&self, job_id: &JobId) -> FolioResult<()> {
        self.sender
            .send(job_id.clone())
            .await
            .map_err(|_| FolioError::Execution("Execution queue is closed".to_string()))
    }
}

impl JobQueue {
    pub async fn recv(&mut self) -> Option<JobId> {
        self.receiver.recv().await
    }
}

/// Runs `complete` for queued jobs
pub struct ExecutionWorker {
    engine: Arc<LifecycleEngine>,
    queue: JobQueue,
    max_concurrent: usize,
}

impl ExecutionWorker {
    pub fn new(engine: Arc<LifecycleEngine>, queue: JobQueue, max_concurrent: usize) -> Self {
        Self {
            engine,
            queue,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Process jobs until `shutdown` resolves or every sender is dropped
    ///
    /// Jobs already running are awaited before returning; queued jobs not
    /// yet started are left `Accepted`.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        info!(max_concurrent = self.max_concurrent, "Execution worker started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Execution worker shutting down");
                    break;
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    log_task_result(result);
                }
                next = next_job(&mut self.queue, &semaphore) => {
                    let Some((job_id, permit)) = next else {
                        debug!("Execution queue closed");
                        break;
                    };
                    let engine = self.engine.clone();
                    tasks.spawn(async move {
                        let _permit = permit;
                        run_job(&engine, job_id).await;
                    });
                }
            }
        }

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for running jobs");
        }
        while let Some(result) = tasks.join_next().await {
            log_task_result(result);
        }
        info!("Execution worker stopped");
    }

    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown))
    }
}

/// Wait for a free slot, then for the next job id
async fn next_job(
    queue: &mut JobQueue,
    semaphore: &Arc<Semaphore>,
) -> Option<(JobId, OwnedSemaphorePermit)> {
    let permit = semaphore.clone().acquire_owned().await.ok()?;
    let job_id = queue.recv().await?;
    Some((job_id, permit))
}

async fn run_job(engine: &LifecycleEngine, job_id: JobId) {
    match engine.complete(&job_id).await {
        Ok(job) => debug!(job_id = %job_id, status = %job.status, "Finished job"),
        Err(e) => warn!(job_id = %job_id, error = %e, "Could not complete job"),
    }
}

fn log_task_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Execution task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{echo_parameters, EchoExecutor, Fixture, RecordingHandoff};
    use async_trait::async_trait;
    use folio_core::{Document, JobStatus};
    use folio_interfaces::{DocumentExecutor, ExecutionReport, JobRepository};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn wait_for_terminal(fixture: &Fixture, job_id: &JobId) -> folio_core::Job {
        for _ in 0..200 {
            let job = fixture.jobs.get(job_id).await.unwrap();
            if job.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not finish");
    }

    #[tokio::test]
    async fn test_worker_completes_submitted_jobs() {
        let fixture = Fixture::new().await;
        let (handoff, queue) = QueueHandoff::channel(8);
        let engine = Arc::new(
            fixture
                .engine(Arc::new(EchoExecutor), Arc::new(handoff))
                .build()
                .unwrap(),
        );
        let (stop, stopped) = oneshot::channel::<()>();
        let worker = ExecutionWorker::new(engine.clone(), queue, 2).spawn(async move {
            let _ = stopped.await;
        });

        let job = engine.accept("echo", echo_parameters(1)).await.unwrap();
        engine.begin(&job).await.unwrap();

        let finished = wait_for_terminal(&fixture, &job.job_id).await;
        assert_eq!(finished.status, JobStatus::Completed);

        stop.send(()).unwrap();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_stops_when_queue_closes() {
        let fixture = Fixture::new().await;
        let (handoff, queue) = QueueHandoff::channel(1);
        drop(handoff);
        let engine = Arc::new(
            fixture
                .engine(Arc::new(EchoExecutor), Arc::new(RecordingHandoff::default()))
                .build()
                .unwrap(),
        );

        let worker = ExecutionWorker::new(engine, queue, 1);
        tokio::time::timeout(Duration::from_secs(5), worker.run(std::future::pending()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_to_closed_queue() {
        let (handoff, queue) = QueueHandoff::channel(1);
        drop(queue);
        let result = handoff.submit(&JobId::from("job")).await;
        assert!(matches!(result, Err(FolioError::Execution(_))));
    }

    struct CountingExecutor {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl DocumentExecutor for CountingExecutor {
        async fn execute(&self, document: Document) -> FolioResult<ExecutionReport> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(ExecutionReport::succeeded(document))
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fixture = Fixture::new().await;
        let executor = Arc::new(CountingExecutor {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let (handoff, queue) = QueueHandoff::channel(16);
        let engine = Arc::new(
            fixture
                .engine(executor.clone(), Arc::new(handoff))
                .build()
                .unwrap(),
        );
        let (stop, stopped) = oneshot::channel::<()>();
        let worker = ExecutionWorker::new(engine.clone(), queue, 2).spawn(async move {
            let _ = stopped.await;
        });

        let mut ids = Vec::new();
        for x in 0..6 {
            let job = engine.accept("echo", echo_parameters(x)).await.unwrap();
            engine.begin(&job).await.unwrap();
            ids.push(job.job_id);
        }
        for id in &ids {
            assert_eq!(wait_for_terminal(&fixture, id).await.status, JobStatus::Completed);
        }

        assert!(executor.peak.load(Ordering::SeqCst) <= 2);
        stop.send(()).unwrap();
        worker.await.unwrap();
    }
}
