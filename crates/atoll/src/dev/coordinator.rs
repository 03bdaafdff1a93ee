//! Watch/rebuild loop.
//!
//! The coordinator owns the [`Lifecycle`] (in dev mode, the running
//! server and its build) and feeds it source changes through a
//! [`RebuildQueue`]. A rebuild runs while the loop keeps draining the change
//! channel, so changes made during a slow build are never lost: they
//! collapse into exactly one follow-up rebuild.

use super::queue::RebuildQueue;
use super::watcher::FileChange;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, OptionFuture};
use std::future::Future;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// New build serving under `generation`
    Reloaded { generation: u64 },
    /// Build failed; the previous generation keeps serving
    Failed { message: String },
}

/// Something that can be torn down and rebuilt on change.
#[async_trait]
pub trait Lifecycle: Send + 'static {
    async fn restart(&mut self) -> RebuildOutcome;
}

type Inflight<L> = BoxFuture<'static, (L, RebuildOutcome)>;

fn start<L: Lifecycle>(mut lifecycle: L) -> Inflight<L> {
    async move {
        let outcome = lifecycle.restart().await;
        (lifecycle, outcome)
    }
    .boxed()
}

pub struct Coordinator<L> {
    lifecycle: L,
}

impl<L: Lifecycle> Coordinator<L> {
    pub fn new(lifecycle: L) -> Self {
        Self { lifecycle }
    }

    /// Run until `shutdown` resolves or the change channel closes.
    ///
    /// Returns the lifecycle so the caller can stop it, or `None` when
    /// shutdown interrupted a rebuild.
    pub async fn run<F>(self, mut changes: mpsc::Receiver<FileChange>, shutdown: F) -> Option<L>
    where
        F: Future<Output = ()> + Send,
    {
        let mut queue = RebuildQueue::new();
        let mut idle = Some(self.lifecycle);
        let mut inflight: Option<Inflight<L>> = None;
        let mut open = true;
        tokio::pin!(shutdown);

        loop {
            if !open && inflight.is_none() {
                break;
            }

            tokio::select! {
                change = changes.recv(), if open => match change {
                    Some(change) => {
                        tracing::debug!(path = %change.path().display(), "change detected");
                        if queue.trigger() {
                            if let Some(lifecycle) = idle.take() {
                                crate::ui::info("Change detected, rebuilding...");
                                inflight = Some(start(lifecycle));
                            }
                        } else {
                            tracing::debug!("rebuild in progress, queued follow-up");
                        }
                    }
                    None => open = false,
                },
                Some((lifecycle, outcome)) = OptionFuture::from(inflight.as_mut()), if inflight.is_some() => {
                    inflight = None;
                    match &outcome {
                        RebuildOutcome::Reloaded { generation } => {
                            tracing::debug!(generation, "rebuild finished");
                        }
                        RebuildOutcome::Failed { message } => {
                            tracing::debug!(%message, "rebuild failed");
                        }
                    }
                    if queue.finish() {
                        tracing::debug!("running queued rebuild");
                        inflight = Some(start(lifecycle));
                    } else {
                        idle = Some(lifecycle);
                    }
                }
                _ = &mut shutdown => {
                    if inflight.is_some() {
                        tracing::debug!("shutdown during rebuild");
                    }
                    break;
                }
            }
        }

        idle
    }
}
