//! Outbound application events.
//!
//! The [`CostumeMachine`](super::machine::CostumeMachine) emits these through
//! the [`EventSink`](super::ports::EventSink) port.

use crate::error::{HardwareFault, PlaybackFault};

use super::state::{CostumeState, Position};

/// Structured events emitted by the costume core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Initial pose reached; carries the starting state.
    Started(CostumeState),

    /// Wings moved.  `strobe` is the strobe flag after the transition.
    PositionChanged { from: Position, to: Position, strobe: bool },

    /// Laser toggled.
    IndicatorChanged(bool),

    /// Phrase button chose `clip` (index into the phrase list).
    PhraseSelected { index: usize, clip: String },

    /// A clip could not be played.
    PlaybackSkipped { clip: String, fault: PlaybackFault },

    /// A line failed while handling an event; the handler carried on.
    OutputFault(HardwareFault),

    /// Teardown finished.
    Stopped,
}
