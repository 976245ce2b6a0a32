//! Internal session messages (not exposed to consumers)
//!
//! Every mutation of session state arrives at the session actor as one of
//! these messages: caller operations from `PlaybackSession`, recurring ticks
//! from the position poller and end-of-clip notifications from the playback
//! resource. Consumers see the results through the observables and
//! `ClipdeckEvent`s instead.

use clipdeck_common::ClipId;
use tokio::sync::oneshot;

use super::types::{Playlist, SessionSnapshot};

#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Sequence a playlist (`play` sends one clip, `play_in_order` many)
    Play(Playlist),
    Stop,
    Pause,
    SetPosition {
        clip_id: ClipId,
        position_ms: u64,
    },
    Background,
    /// Final message: release everything and end the actor
    Teardown,

    /// Natural end of clip, from the resource allocated at `epoch` during
    /// play run `run`
    Completion { epoch: u64, run: u64 },

    /// Poller tick from the poller run identified by `generation`
    SamplePosition { generation: u64 },

    /// Report current state once every earlier message has been applied
    Snapshot(oneshot::Sender<SessionSnapshot>),
}
