//! The single background worker task.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use super::{Completion, JobId, JobInfo, JobStatus};
use crate::error::CommandError;
use crate::executor::{BatchOp, Executor};

struct Job {
    id: JobId,
    op: BatchOp,
    clipboard_generation: Option<u64>,
}

struct JobRecord {
    description: String,
    status: JobStatus,
}

type JobTable = Arc<RwLock<BTreeMap<JobId, JobRecord>>>;

/// Finished jobs kept for `jobs`; older ones are forgotten.
pub const FINISHED_JOBS_KEPT: usize = 32;

/// Handle to the background worker.
///
/// Jobs run strictly in dispatch order, so two batches touching the same
/// directory never interleave.
pub struct Worker {
    queue: Option<mpsc::UnboundedSender<Job>>,
    jobs: JobTable,
    next_id: u64,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker task on the current tokio runtime.
    pub fn spawn(executor: Executor, completions: mpsc::UnboundedSender<Completion>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let jobs: JobTable = Arc::new(RwLock::new(BTreeMap::new()));
        let handle = tokio::spawn(run(executor, rx, jobs.clone(), completions));
        Self {
            queue: Some(tx),
            jobs,
            next_id: 1,
            handle: Some(handle),
        }
    }

    /// Queue `op`. Returns as soon as the job is queued.
    pub async fn dispatch(
        &mut self,
        op: BatchOp,
        clipboard_generation: Option<u64>,
    ) -> Result<JobId, CommandError> {
        let queue = self.queue.as_ref().ok_or(CommandError::WorkerStopped)?;
        let id = JobId(self.next_id);
        self.next_id += 1;

        let description = op.describe();
        self.jobs.write().await.insert(
            id,
            JobRecord {
                description: description.clone(),
                status: JobStatus::Queued,
            },
        );

        let job = Job {
            id,
            op,
            clipboard_generation,
        };
        if queue.send(job).is_err() {
            self.jobs.write().await.remove(&id);
            return Err(CommandError::WorkerStopped);
        }
        tracing::info!(job = %id, op = %description, "batch queued");
        Ok(id)
    }

    pub async fn status(&self, id: JobId) -> Option<JobStatus> {
        self.jobs.read().await.get(&id).map(|r| r.status)
    }

    /// Unfinished jobs plus the most recent finished ones, oldest first.
    pub async fn list(&self) -> Vec<JobInfo> {
        self.jobs
            .read()
            .await
            .iter()
            .map(|(id, record)| JobInfo {
                id: *id,
                description: record.description.clone(),
                status: record.status,
            })
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.queue.is_some()
    }

    /// Stop accepting jobs and wait until every queued job has run.
    pub async fn shutdown(&mut self) {
        self.queue = None;
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

async fn run(
    executor: Executor,
    mut queue: mpsc::UnboundedReceiver<Job>,
    jobs: JobTable,
    completions: mpsc::UnboundedSender<Completion>,
) {
    while let Some(job) = queue.recv().await {
        set_status(&jobs, job.id, JobStatus::Running).await;
        tracing::info!(job = %job.id, op = %job.op.describe(), "batch started");

        let result = executor.run(&job.op).await;

        let status = JobStatus::from_result(&result);
        set_status(&jobs, job.id, status).await;
        forget_old_jobs(&jobs).await;
        tracing::info!(
            job = %job.id,
            status = %status,
            summary = %result.summary(),
            "batch finished"
        );

        let completion = Completion {
            job: job.id,
            op: job.op,
            clipboard_generation: job.clipboard_generation,
            result,
        };
        if completions.send(completion).is_err() {
            tracing::debug!(job = %job.id, "controller gone, completion dropped");
        }
    }
    tracing::debug!("worker queue closed");
}

async fn set_status(jobs: &JobTable, id: JobId, status: JobStatus) {
    if let Some(record) = jobs.write().await.get_mut(&id) {
        record.status = status;
    }
}

async fn forget_old_jobs(jobs: &JobTable) {
    let mut jobs = jobs.write().await;
    let finished: Vec<JobId> = jobs
        .iter()
        .filter(|(_, record)| record.status.is_finished())
        .map(|(id, _)| *id)
        .collect();
    let excess = finished.len().saturating_sub(FINISHED_JOBS_KEPT);
    for id in &finished[..excess] {
        jobs.remove(id);
    }
}
