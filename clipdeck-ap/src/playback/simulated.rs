//! Clock-driven playback resource
//!
//! Plays nothing audible: each clip in the [`ClipCatalog`] has a duration,
//! and the resource advances its offset with the tokio clock while playing.
//! When the offset reaches the clip's duration it reports completion, which
//! is enough to drive a session end to end without audio hardware (and under
//! a paused test clock).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::resource::{CompletionNotifier, LoadError, PlaybackResource};

/// Known clip URIs and their durations
#[derive(Debug, Clone, Default)]
pub struct ClipCatalog {
    durations_ms: HashMap<String, u64>,
}

impl ClipCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, duration_ms: u64) {
        self.durations_ms.insert(uri.into(), duration_ms);
    }

    pub fn with_clip(mut self, uri: impl Into<String>, duration_ms: u64) -> Self {
        self.insert(uri, duration_ms);
        self
    }

    pub fn duration_of(&self, uri: &str) -> Option<u64> {
        self.durations_ms.get(uri).copied()
    }

    pub fn len(&self) -> usize {
        self.durations_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations_ms.is_empty()
    }
}

/// Playback resource that plays catalog clips against the tokio clock
pub struct SimulatedResource {
    catalog: Arc<ClipCatalog>,
    completion: CompletionNotifier,
    loaded: Option<LoadedClip>,
}

struct LoadedClip {
    uri: String,
    duration_ms: u64,
    /// Offset at the last play/pause/seek
    anchor_ms: u64,
    /// Set while playing
    playing_since: Option<Instant>,
    completion_timer: Option<JoinHandle<()>>,
}

impl LoadedClip {
    fn position_ms(&self) -> u64 {
        let elapsed_ms = self
            .playing_since
            .map(|since| since.elapsed().as_millis() as u64)
            .unwrap_or(0);
        (self.anchor_ms + elapsed_ms).min(self.duration_ms)
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    /// Start the clock and arm the completion timer
    fn start(&mut self, completion: &CompletionNotifier) {
        if self.is_playing() {
            return;
        }

        self.playing_since = Some(Instant::now());
        let remaining = Duration::from_millis(self.duration_ms.saturating_sub(self.anchor_ms));
        let completion = completion.clone();
        self.completion_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            completion.notify();
        }));
    }

    /// Freeze the clock at the current offset
    fn halt(&mut self) {
        self.anchor_ms = self.position_ms();
        self.playing_since = None;
        if let Some(timer) = self.completion_timer.take() {
            timer.abort();
        }
    }
}

impl Drop for LoadedClip {
    fn drop(&mut self) {
        self.halt();
    }
}

impl SimulatedResource {
    pub fn new(catalog: Arc<ClipCatalog>, completion: CompletionNotifier) -> Self {
        Self {
            catalog,
            completion,
            loaded: None,
        }
    }

    /// Factory for a session: every allocation shares `catalog`
    pub fn factory(
        catalog: Arc<ClipCatalog>,
    ) -> impl FnMut(CompletionNotifier) -> SimulatedResource + Send {
        move |completion| SimulatedResource::new(Arc::clone(&catalog), completion)
    }

    pub fn loaded_uri(&self) -> Option<&str> {
        self.loaded.as_ref().map(|clip| clip.uri.as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.loaded.as_ref().is_some_and(LoadedClip::is_playing)
    }
}

impl PlaybackResource for SimulatedResource {
    fn load(&mut self, uri: &str) -> Result<(), LoadError> {
        if uri.trim().is_empty() {
            return Err(LoadError::Malformed(uri.to_string()));
        }
        let duration_ms = self
            .catalog
            .duration_of(uri)
            .ok_or_else(|| LoadError::MissingSource(uri.to_string()))?;

        debug!(uri, duration_ms, "Simulated resource loaded clip");
        self.loaded = Some(LoadedClip {
            uri: uri.to_string(),
            duration_ms,
            anchor_ms: 0,
            playing_since: None,
            completion_timer: None,
        });
        Ok(())
    }

    fn play(&mut self) {
        match self.loaded.as_mut() {
            Some(clip) => clip.start(&self.completion),
            None => debug!("play() with no clip loaded"),
        }
    }

    fn pause(&mut self) {
        if let Some(clip) = self.loaded.as_mut() {
            clip.halt();
        }
    }

    fn stop(&mut self) {
        if let Some(clip) = self.loaded.as_mut() {
            clip.halt();
            clip.anchor_ms = 0;
        }
    }

    fn seek_to(&mut self, position_ms: u64) {
        if let Some(clip) = self.loaded.as_mut() {
            let was_playing = clip.is_playing();
            clip.halt();
            clip.anchor_ms = position_ms.min(clip.duration_ms);
            if was_playing {
                clip.start(&self.completion);
            }
        }
    }

    fn current_position(&self) -> u64 {
        self.loaded.as_ref().map(LoadedClip::position_ms).unwrap_or(0)
    }

    fn release(self) {
        debug!(uri = ?self.loaded_uri(), "Simulated resource released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::events::SessionCommand;
    use tokio::sync::mpsc;

    fn catalog() -> Arc<ClipCatalog> {
        Arc::new(
            ClipCatalog::new()
                .with_clip("sim://short", 1_000)
                .with_clip("sim://long", 10_000),
        )
    }

    #[test]
    fn test_load_unknown_uri_keeps_current_clip() {
        let mut resource = SimulatedResource::new(catalog(), CompletionNotifier::detached());
        resource.load("sim://short").unwrap();

        assert_eq!(
            resource.load("sim://missing"),
            Err(LoadError::MissingSource("sim://missing".to_string()))
        );
        assert!(matches!(resource.load("  "), Err(LoadError::Malformed(_))));
        assert_eq!(resource.loaded_uri(), Some("sim://short"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_follows_clock_while_playing() {
        let mut resource = SimulatedResource::new(catalog(), CompletionNotifier::detached());
        resource.load("sim://long").unwrap();
        resource.play();
        assert!(resource.is_playing());

        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(resource.current_position(), 2_500);

        resource.pause();
        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert_eq!(resource.current_position(), 2_500);

        resource.seek_to(7_000);
        assert_eq!(resource.current_position(), 7_000);

        resource.stop();
        assert_eq!(resource.current_position(), 0);
        assert!(!resource.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_fires_at_end_of_clip() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut resource = SimulatedResource::new(catalog(), CompletionNotifier::new(tx.downgrade(), 9));
        resource.load("sim://short").unwrap();
        resource.seek_to(400);
        resource.play();

        tokio::time::sleep(Duration::from_millis(599)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        match rx.try_recv() {
            Ok(SessionCommand::Completion { epoch, .. }) => assert_eq!(epoch, 9),
            other => panic!("Expected Completion, got {:?}", other),
        }
        assert_eq!(resource.current_position(), 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_disarms_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut resource = SimulatedResource::new(catalog(), CompletionNotifier::new(tx.downgrade(), 1));
        resource.load("sim://short").unwrap();
        resource.play();
        tokio::time::sleep(Duration::from_millis(500)).await;
        resource.pause();

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert!(rx.try_recv().is_err());
        resource.release();
    }
}
