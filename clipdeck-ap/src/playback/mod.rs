//! Playback session controller
//!
//! - `handle`: [`PlaybackSession`], the public handle and actor loop
//! - `session`: the state machine the actor drives
//! - `positions`: per-clip stored positions
//! - `poller`: recurring position sampling and the scheduler capability
//! - `resource`: the playback resource capability
//! - `simulated`: a clock-driven resource for running without audio output

mod events;
pub mod handle;
pub mod poller;
pub mod positions;
pub mod resource;
mod session;
pub mod simulated;
mod state;
pub mod types;

pub use handle::{IsPlaying, PlaybackSession};
pub use poller::{Scheduler, TokioScheduler};
pub use positions::PositionStore;
pub use resource::{CompletionNotifier, LoadError, PlaybackResource, ResourceFactory};
pub use simulated::{ClipCatalog, SimulatedResource};
pub use types::{ClipSource, CurrentlyPlaying, PlaybackFailure, Playlist, SessionSnapshot};
