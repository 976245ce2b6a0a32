//! Position polling
//!
//! While a clip is playing the session samples the resource offset on a
//! fixed period. The recurring schedule comes from a [`Scheduler`] owned by
//! the session, so cancelling it never affects another session.
//!
//! Ticks are delivered as `SamplePosition` messages tagged with the poller
//! run that produced them. A tick still in the inbox when its run is stopped
//! is rejected by [`PositionPoller::accepts`], which makes cancellation take
//! effect immediately from the session's point of view.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::events::SessionCommand;

/// Recurring-callback capability
pub trait Scheduler: Send {
    /// Run `tick` every `period` until cancelled, replacing any earlier schedule
    fn schedule(&mut self, period: Duration, tick: Box<dyn FnMut() + Send>);

    /// Cancel the pending schedule, if any
    fn cancel(&mut self);
}

/// Scheduler backed by a tokio task
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    task: Option<JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, period: Duration, mut tick: Box<dyn FnMut() + Send>) {
        self.cancel();

        self.task = Some(tokio::spawn(async move {
            // First tick one period from now, not immediately
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick();
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Drives a scheduler so that at most one sampling schedule runs at a time
pub(crate) struct PositionPoller<S: Scheduler> {
    scheduler: S,
    period: Duration,
    generation: u64,
    running: bool,
}

impl<S: Scheduler> PositionPoller<S> {
    pub fn new(scheduler: S, period: Duration) -> Self {
        Self {
            scheduler,
            period,
            generation: 0,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start sampling into `inbox`. No-op if already running.
    pub fn start(&mut self, inbox: &mpsc::WeakUnboundedSender<SessionCommand>) {
        if self.running {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let inbox = inbox.clone();
        self.scheduler.schedule(
            self.period,
            Box::new(move || {
                if let Some(tx) = inbox.upgrade() {
                    let _ = tx.send(SessionCommand::SamplePosition { generation });
                }
            }),
        );
        self.running = true;
        debug!(generation, period_ms = self.period.as_millis() as u64, "Position poller started");
    }

    /// Cancel the schedule and mark the poller stopped
    pub fn stop(&mut self) {
        self.scheduler.cancel();
        if self.running {
            debug!(generation = self.generation, "Position poller stopped");
        }
        self.running = false;
    }

    /// Whether a tick from run `generation` may be applied
    pub fn accepts(&self, generation: u64) -> bool {
        let accepted = self.running && generation == self.generation;
        if !accepted {
            trace!(generation, current = self.generation, "Discarding stale position tick");
        }
        accepted
    }
}
