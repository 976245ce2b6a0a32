//! Playback resource that records what the session asks of it

use clipdeck_ap::playback::{CompletionNotifier, LoadError, PlaybackResource};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// One call made on a [`RecordingResource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceCall {
    Load(String),
    Seek(u64),
    Play,
    Pause,
    Stop,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<ResourceCall>,
    allocations: usize,
    releases: usize,
    position_ms: u64,
    failing_uris: HashSet<String>,
    /// Notifier of each allocation, oldest first
    notifiers: Vec<CompletionNotifier>,
}

pub struct RecordingResource {
    recorded: Arc<Mutex<Recorded>>,
}

impl PlaybackResource for RecordingResource {
    fn load(&mut self, uri: &str) -> Result<(), LoadError> {
        let mut recorded = self.recorded.lock().unwrap();
        if recorded.failing_uris.contains(uri) {
            return Err(LoadError::MissingSource(uri.to_string()));
        }
        recorded.calls.push(ResourceCall::Load(uri.to_string()));
        Ok(())
    }

    fn play(&mut self) {
        self.recorded.lock().unwrap().calls.push(ResourceCall::Play);
    }

    fn pause(&mut self) {
        self.recorded.lock().unwrap().calls.push(ResourceCall::Pause);
    }

    fn stop(&mut self) {
        self.recorded.lock().unwrap().calls.push(ResourceCall::Stop);
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.recorded
            .lock()
            .unwrap()
            .calls
            .push(ResourceCall::Seek(position_ms));
    }

    fn current_position(&self) -> u64 {
        self.recorded.lock().unwrap().position_ms
    }

    fn release(self) {
        self.recorded.lock().unwrap().releases += 1;
    }
}

/// Test-side view shared by every resource a factory creates
#[derive(Clone, Default)]
pub struct ResourceProbe {
    recorded: Arc<Mutex<Recorded>>,
}

impl ResourceProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> impl FnMut(CompletionNotifier) -> RecordingResource + Send + 'static {
        let recorded = Arc::clone(&self.recorded);
        move |completion| {
            {
                let mut state = recorded.lock().unwrap();
                state.allocations += 1;
                state.notifiers.push(completion);
            }
            RecordingResource {
                recorded: Arc::clone(&recorded),
            }
        }
    }

    /// Make loads of `uri` fail
    pub fn fail_on(&self, uri: &str) {
        self.lock().failing_uris.insert(uri.to_string());
    }

    /// Offset reported by `current_position`
    pub fn set_position(&self, position_ms: u64) {
        self.lock().position_ms = position_ms;
    }

    /// Report natural completion from the newest allocation
    pub fn complete(&self) {
        let notifier = self.lock().notifiers.last().cloned();
        notifier.expect("a resource was allocated").notify();
    }

    /// Report completion from allocation `index` (0-based), even if released
    pub fn complete_from(&self, index: usize) {
        let notifier = self.lock().notifiers[index].clone();
        notifier.notify();
    }

    pub fn calls(&self) -> Vec<ResourceCall> {
        self.lock().calls.clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ResourceCall::Load(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &ResourceCall) -> usize {
        self.lock().calls.iter().filter(|made| *made == call).count()
    }

    pub fn allocations(&self) -> usize {
        self.lock().allocations
    }

    pub fn releases(&self) -> usize {
        self.lock().releases
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}
