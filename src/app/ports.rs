//! Port traits: the boundary between the costume logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CostumeMachine (domain)
//! ```
//!
//! Digital lines use the `embedded-hal` 1.0 traits directly, so any HAL
//! (rppal on a Raspberry Pi, the recording mocks in `tests/`) plugs in:
//!
//! | Capability          | Trait                                 |
//! |---------------------|---------------------------------------|
//! | Button input        | [`InputPin`]                          |
//! | Strobe / laser line | [`OutputPin`]                         |
//! | Servo signal        | [`SetDutyCycle`]                      |
//! | Sound playback      | [`AudioPlayer`]                       |
//! | Action log          | [`EventSink`]                         |

use std::path::Path;

pub use embedded_hal::digital::{InputPin, OutputPin, PinState};
pub use embedded_hal::pwm::SetDutyCycle;

use crate::error::PlaybackFault;

// ───────────────────────────────────────────────────────────────
// Audio port (driven adapter: domain → speaker)
// ───────────────────────────────────────────────────────────────

/// Starts playback of an audio file and returns immediately.
///
/// Implementations must accept overlapping calls; whether clips mix or
/// queue is up to the backend.
pub trait AudioPlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackFault>;
}

/// `None` stands in for an audio device that failed to open.
impl<A: AudioPlayer> AudioPlayer for Option<A> {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackFault> {
        match self {
            Some(player) => player.play(path),
            None => Err(PlaybackFault::PlayerUnavailable),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The machine emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
