//! Test helper modules for clipdeck-ap integration tests
//!
//! - `recording_resource`: a playback resource that records every call
//! - `manual_scheduler`: a poller scheduler whose ticks the test fires by hand

#![allow(dead_code)]

pub mod manual_scheduler;
pub mod recording_resource;

pub use manual_scheduler::{ManualScheduler, SchedulerProbe};
pub use recording_resource::{ResourceCall, ResourceProbe};

use clipdeck_ap::{PlaybackSession, SessionSettings};
use tokio::task::JoinHandle;

/// A session wired to a recording resource and a manual scheduler
pub struct TestSession {
    pub session: PlaybackSession,
    pub task: JoinHandle<()>,
    pub resource: ResourceProbe,
    pub scheduler: SchedulerProbe,
}

impl TestSession {
    pub fn spawn() -> Self {
        let resource = ResourceProbe::new();
        let (scheduler, scheduler_probe) = ManualScheduler::new();
        let (session, task) =
            PlaybackSession::spawn(resource.factory(), scheduler, &SessionSettings::default());
        Self {
            session,
            task,
            resource,
            scheduler: scheduler_probe,
        }
    }

    /// Wait until the session has applied every operation sent so far
    pub async fn settle(&self) -> clipdeck_ap::SessionSnapshot {
        self.session.snapshot().await.expect("session is running")
    }
}
