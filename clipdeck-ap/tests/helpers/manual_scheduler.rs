//! Scheduler driven by the test instead of a clock

use clipdeck_ap::playback::Scheduler;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Tick = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct Ticks {
    current: Option<Tick>,
    cancelled: Vec<Tick>,
    schedules: usize,
}

/// Scheduler handed to the session
pub struct ManualScheduler {
    ticks: Arc<Mutex<Ticks>>,
}

/// Test-side view of a [`ManualScheduler`]
#[derive(Clone)]
pub struct SchedulerProbe {
    ticks: Arc<Mutex<Ticks>>,
}

impl ManualScheduler {
    pub fn new() -> (Self, SchedulerProbe) {
        let ticks = Arc::new(Mutex::new(Ticks::default()));
        (
            Self {
                ticks: Arc::clone(&ticks),
            },
            SchedulerProbe { ticks },
        )
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, _period: Duration, tick: Tick) {
        let mut ticks = self.ticks.lock().unwrap();
        if let Some(previous) = ticks.current.replace(tick) {
            ticks.cancelled.push(previous);
        }
        ticks.schedules += 1;
    }

    fn cancel(&mut self) {
        let mut ticks = self.ticks.lock().unwrap();
        if let Some(previous) = ticks.current.take() {
            ticks.cancelled.push(previous);
        }
    }
}

impl SchedulerProbe {
    /// Fire the live tick; returns false if nothing is scheduled
    pub fn fire(&self) -> bool {
        match self.ticks.lock().unwrap().current.as_mut() {
            Some(tick) => {
                tick();
                true
            }
            None => false,
        }
    }

    /// Fire every tick that has since been cancelled, as a late timer would
    pub fn fire_cancelled(&self) -> usize {
        let mut ticks = self.ticks.lock().unwrap();
        for tick in ticks.cancelled.iter_mut() {
            tick();
        }
        ticks.cancelled.len()
    }

    pub fn is_scheduled(&self) -> bool {
        self.ticks.lock().unwrap().current.is_some()
    }

    /// How many times polling has been started
    pub fn schedules(&self) -> usize {
        self.ticks.lock().unwrap().schedules
    }
}
