//! Worker nodes: a ring node with a task-processing loop attached.
//!
//! A worker is composed, not specialized: [WorkerNode] owns a plain
//! [RingNode] plus one background loop, and the loop touches the ring only
//! through the node's put/get contract — it reads the payload from the
//! task's request key and writes the produced record under its result key.
//! Where tasks come from is behind the [TaskSource] capability, so a
//! remote queue and the in-process [TaskChannel] are interchangeable.

pub mod processor;
mod task;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub use task::Task;
pub use task::TaskKind;

use crate::dht::Finger;
use crate::dht::RingNode;
use crate::error::Error;
use crate::error::Result;
use crate::rpc::ChordNode;

/// Source of tasks for a worker loop.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Next task to process, or `None` once the source is closed.
    async fn take(&self) -> Option<Task>;
}

/// In-process task source backed by an mpsc channel.
pub struct TaskChannel {
    inner: Mutex<mpsc::Receiver<Task>>,
}

impl TaskChannel {
    /// Create a channel source; the returned sender submits tasks.
    pub fn new(capacity: usize) -> (mpsc::Sender<Task>, Arc<Self>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            Arc::new(Self {
                inner: Mutex::new(rx),
            }),
        )
    }
}

#[async_trait]
impl TaskSource for TaskChannel {
    async fn take(&self) -> Option<Task> {
        self.inner.lock().await.recv().await
    }
}

/// The processing loop of a worker.
pub struct TaskWorker {
    node: Arc<RingNode>,
    source: Arc<dyn TaskSource>,
}

impl TaskWorker {
    /// A loop that feeds tasks from `source` through `node`.
    pub fn new(node: Arc<RingNode>, source: Arc<dyn TaskSource>) -> Self {
        Self { node, source }
    }

    /// Drain the source until it closes, processing each task. Failures
    /// are logged per task; the loop keeps going.
    pub async fn run(&self) {
        while let Some(task) = self.source.take().await {
            match self.process(&task).await {
                Ok(Some(owner)) => {
                    tracing::info!(%task, owner = %owner.key(), "processed task");
                }
                Ok(None) => {
                    tracing::debug!(%task, "skipped task without a transform");
                }
                Err(error) => {
                    tracing::error!(%task, %error, "failed to process task");
                }
            }
        }
        tracing::info!(node = %self.node.key(), "task source closed, worker loop ending");
    }

    async fn process(&self, task: &Task) -> Result<Option<Finger>> {
        let transform = match task.kind() {
            TaskKind::WordMetrics => processor::word_metrics,
            TaskKind::Encrypt => processor::encrypt,
            TaskKind::Digest => processor::digest,
            TaskKind::Undefined => return Ok(None),
        };
        let payload = self
            .node
            .get(&task.request_key())
            .await?
            .ok_or_else(|| Error::TaskPayloadMissing(task.request_key()))?;
        let record = transform(&payload)?;
        let owner = self.node.put(&task.result_key(), record).await?;
        Ok(Some(owner))
    }
}

/// A ring node with a task-processing loop running beside it.
pub struct WorkerNode {
    node: Arc<RingNode>,
    worker: JoinHandle<()>,
}

impl WorkerNode {
    /// Attach a worker loop over `source` to `node`.
    pub fn attach(node: Arc<RingNode>, source: Arc<dyn TaskSource>) -> Self {
        let task_loop = TaskWorker::new(node.clone(), source);
        let worker = tokio::spawn(async move { task_loop.run().await });
        Self { node, worker }
    }

    /// The underlying ring node.
    pub fn node(&self) -> &Arc<RingNode> {
        &self.node
    }

    /// Whether the attached loop is still draining its source.
    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Stop the loop without touching the node.
    pub fn detach(self) -> Arc<RingNode> {
        self.worker.abort();
        self.node
    }
}
