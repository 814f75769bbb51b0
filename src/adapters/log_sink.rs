//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one line per application event to
//! the `log` facade (journald / console on the Pi).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(s) => {
                info!(
                    "START | position={:?} laser={} strobe={}",
                    s.position, s.indicator_on, s.strobe_active
                );
            }
            AppEvent::PositionChanged { from, to, strobe } => {
                info!("STATE | {:?} -> {:?} | strobe={}", from, to, strobe);
            }
            AppEvent::IndicatorChanged(on) => {
                info!("INDICATOR | laser {}", if *on { "ON" } else { "OFF" });
            }
            AppEvent::PhraseSelected { index, clip } => {
                info!("SOUND | phrase #{} {}", index, clip);
            }
            AppEvent::PlaybackSkipped { clip, fault } => {
                warn!("SOUND | skipped {}: {}", clip, fault);
            }
            AppEvent::OutputFault(fault) => {
                warn!("FAULT | {}", fault);
            }
            AppEvent::Stopped => {
                info!("STOP  | outputs released");
            }
        }
    }
}
