//! Per-clip playback positions
//!
//! Every clip id maps to a `watch` channel holding its last known offset in
//! milliseconds. Entries are created on first access with offset 0 and are
//! never removed for the life of the session. Only the session actor writes;
//! handles read and subscribe, so observers are notified without going
//! through the actor.

use clipdeck_common::ClipId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    entries: Arc<Mutex<HashMap<ClipId, watch::Sender<u64>>>>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known offset for `clip_id` (0 if never seen)
    pub fn get(&self, clip_id: &ClipId) -> u64 {
        self.with_entry(clip_id, |sender| *sender.borrow())
    }

    /// Store an offset, returning true if it differed from the stored one
    ///
    /// Observers are only woken when the value changes.
    pub fn set(&self, clip_id: &ClipId, position_ms: u64) -> bool {
        self.with_entry(clip_id, |sender| {
            sender.send_if_modified(|current| {
                if *current == position_ms {
                    false
                } else {
                    *current = position_ms;
                    true
                }
            })
        })
    }

    pub fn reset(&self, clip_id: &ClipId) {
        self.set(clip_id, 0);
    }

    /// Observe the offset for `clip_id`, creating the entry if needed
    pub fn subscribe(&self, clip_id: &ClipId) -> watch::Receiver<u64> {
        self.with_entry(clip_id, |sender| sender.subscribe())
    }

    /// Number of clips with an entry
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn with_entry<T>(&self, clip_id: &ClipId, f: impl FnOnce(&watch::Sender<u64>) -> T) -> T {
        let mut entries = self.lock();
        let sender = entries
            .entry(clip_id.clone())
            .or_insert_with(|| watch::channel(0).0);
        f(sender)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ClipId, watch::Sender<u64>>> {
        // Entries stay valid even if a holder panicked mid-update
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
