//! Message-passing boundary around `enhance`.
//!
//! One tokio task owns the request channel and serves requests strictly in
//! arrival order. Each pass runs on the blocking pool so the synchronous
//! (nodes × rules) scan never stalls the async runtime, and a caller either
//! gets the whole result or an error.

use std::sync::Arc;
use stylemap_core::{DesignTree, EnhanceError, EnhanceOptions, EnhancementResult, enhance};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Enhancement worker has shut down.")]
    Closed,

    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    #[error("Enhancement task failed: {0}")]
    Task(String),
}

type Reply = Result<EnhancementResult, WorkerError>;

/// One queued enhancement call.
pub struct EnhanceRequest {
    pub tree: Arc<DesignTree>,
    pub style_text: String,
    pub options: EnhanceOptions,
    pub reply: oneshot::Sender<Reply>,
}

pub struct EnhanceWorker;

impl EnhanceWorker {
    /// Start the worker task. It stops once every handle has been dropped.
    pub fn spawn(capacity: usize) -> (EnhanceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(serve(rx));
        (EnhanceHandle { tx }, task)
    }
}

/// Cloneable sender side of the worker.
#[derive(Debug, Clone)]
pub struct EnhanceHandle {
    tx: mpsc::Sender<EnhanceRequest>,
}

impl EnhanceHandle {
    /// Queue one enhancement and wait for its result.
    pub async fn enhance(
        &self,
        tree: Arc<DesignTree>,
        style_text: impl Into<String>,
        options: EnhanceOptions,
    ) -> Result<EnhancementResult, WorkerError> {
        let (reply, rx) = oneshot::channel();
        let request = EnhanceRequest {
            tree,
            style_text: style_text.into(),
            options,
            reply,
        };
        self.tx
            .send(request)
            .await
            .map_err(|_| WorkerError::Closed)?;
        rx.await.map_err(|_| WorkerError::Closed)?
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

async fn serve(mut rx: mpsc::Receiver<EnhanceRequest>) {
    let mut served = 0usize;
    while let Some(request) = rx.recv().await {
        let EnhanceRequest {
            tree,
            style_text,
            options,
            reply,
        } = request;

        let outcome =
            tokio::task::spawn_blocking(move || enhance(&tree, &style_text, &options)).await;
        let outcome = match outcome {
            Ok(result) => result.map_err(WorkerError::from),
            Err(e) => Err(WorkerError::Task(e.to_string())),
        };
        served += 1;

        if reply.send(outcome).is_err() {
            log::debug!("enhancement caller went away before the result was ready");
        }
    }
    log::debug!("enhancement worker stopped after {served} requests");
}
