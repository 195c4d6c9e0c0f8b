/*
   Issuer

   The single logical worker that issues every remote adapter call for a chat.

   Callers hand it a future (an adapter call) and await the result on a
   oneshot. The worker drives all in-flight calls from one task, so calls are
   started strictly in submission order and a slow call never blocks the
   submission of the next one.

    ┌──────────┐  job   ┌──────────────────────────────┐
    │  Chat    │───────►│  Issuer task                 │
    │  method  │        │  FuturesUnordered<job>       │
    │          │◄───────│  (one task, many in-flight)  │
    └──────────┘ result └──────────────────────────────┘
*/

use crate::core_chat::errors::{ChatError, ChatResult};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

type Job = BoxFuture<'static, ()>;

/// Handle for submitting work to the issuer task
#[derive(Clone)]
pub struct Issuer {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Issuer {
    /// Spawn the issuer task. It runs until `shutdown` is cancelled or every
    /// handle is dropped.
    pub fn spawn(shutdown: CancellationToken) -> (Self, JoinHandle<()>) {
        let (jobs, job_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(job_rx, shutdown));
        (Self { jobs }, handle)
    }

    /// Issue `call` from the worker and wait for its output
    pub async fn call<F, T>(&self, call: F) -> ChatResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = result_tx.send(call.await);
        });

        self.jobs.send(job).map_err(|_| ChatError::WorkerStopped)?;
        result_rx.await.map_err(|_| ChatError::WorkerStopped)
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

async fn run(mut job_rx: mpsc::UnboundedReceiver<Job>, shutdown: CancellationToken) {
    let mut in_flight = FuturesUnordered::new();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}

            job = job_rx.recv() => match job {
                Some(job) => {
                    in_flight.push(job);
                    trace!(in_flight = in_flight.len(), "Issued adapter call");
                }
                None => break,
            },
        }
    }

    debug!(abandoned = in_flight.len(), "Issuer stopped");
}
