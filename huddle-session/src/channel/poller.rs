use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A running poll loop. Dropping the handle does not stop the loop; call
/// [`PollHandle::cancel`] or cancel the token it was spawned with.
pub struct PollHandle {
    name: &'static str,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to exit. Does not cancel it.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Runs `tick` every `period` until `cancel` fires or `tick` breaks.
///
/// The first tick happens one full period after spawning. A slow tick delays
/// the next one; ticks never overlap and never burst to catch up.
pub fn spawn_poll<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    if tick().await.is_break() {
                        break;
                    }
                }
            }
        }

        debug!(poll = name, "poll loop stopped");
    });

    PollHandle { name, cancel, task }
}
