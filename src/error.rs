//! Unified error types for the costume controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! supervisor's error handling uniform.  Hardware and playback faults are
//! `Copy` so they can be logged and passed through the event sink without
//! allocation; configuration faults may carry a parser message.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An I/O line could not be acquired, driven or read.
    Hardware(HardwareFault),
    /// A sound clip could not be played.
    Playback(PlaybackFault),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigFault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Playback(e) => write!(f, "playback: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

/// Fatal at startup, logged-and-ignored at runtime for non-critical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareFault {
    /// The GPIO peripheral itself could not be opened.
    Unavailable,
    /// A pin could not be claimed (busy, or not present on this board).
    Acquire { pin: u8 },
    /// Writing an output line failed.
    Write { line: &'static str },
    /// Reading an input line failed.
    Read { line: &'static str },
    /// Setting a PWM duty cycle failed.
    Pwm { line: &'static str },
    /// The strobe task died and took its output line with it.
    TaskLost { line: &'static str },
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "GPIO peripheral unavailable"),
            Self::Acquire { pin } => write!(f, "could not acquire GPIO {pin}"),
            Self::Write { line } => write!(f, "{line} write failed"),
            Self::Read { line } => write!(f, "{line} read failed"),
            Self::Pwm { line } => write!(f, "{line} PWM write failed"),
            Self::TaskLost { line } => write!(f, "{line} task terminated abnormally"),
        }
    }
}

impl std::error::Error for HardwareFault {}

impl From<HardwareFault> for Error {
    fn from(e: HardwareFault) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Playback faults
// ---------------------------------------------------------------------------

/// Always non-fatal: logged, and the clip is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackFault {
    /// The resolved clip file does not exist.
    ClipMissing,
    /// No audio output is available.
    PlayerUnavailable,
    /// The clip exists but could not be decoded.
    DecodeFailed,
}

impl fmt::Display for PlaybackFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClipMissing => write!(f, "clip not found"),
            Self::PlayerUnavailable => write!(f, "audio player unavailable"),
            Self::DecodeFailed => write!(f, "clip could not be decoded"),
        }
    }
}

impl std::error::Error for PlaybackFault {}

impl From<PlaybackFault> for Error {
    fn from(e: PlaybackFault) -> Self {
        Self::Playback(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration faults
// ---------------------------------------------------------------------------

/// Fatal at startup.  Always detected before any I/O is acquired.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigFault {
    /// A pin number is outside the BCM range the board exposes.
    InvalidPin { name: &'static str, pin: u8 },
    /// Two lines were assigned the same pin.
    DuplicatePin(u8),
    /// A duty cycle is not a finite value in `0.0..=100.0`.
    DutyOutOfRange(&'static str),
    /// A frequency is not a finite value inside its allowed band.
    FrequencyOutOfRange(&'static str),
    /// A timing parameter is outside its allowed band.
    TimingOutOfRange(&'static str),
    /// The phrase list is empty.
    NoPhrases,
    /// The config file could not be read.
    Unreadable(String),
    /// The config file is not valid JSON for [`CostumeConfig`](crate::config::CostumeConfig).
    Malformed(String),
}

impl fmt::Display for ConfigFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin { name, pin } => write!(f, "{name}: GPIO {pin} is not a valid BCM pin"),
            Self::DuplicatePin(pin) => write!(f, "GPIO {pin} is assigned more than once"),
            Self::DutyOutOfRange(name) => write!(f, "{name}: duty cycle must be within 0-100%"),
            Self::FrequencyOutOfRange(name) => write!(f, "{name}: frequency out of range"),
            Self::TimingOutOfRange(name) => write!(f, "{name}: out of range"),
            Self::NoPhrases => write!(f, "phrase list is empty"),
            Self::Unreadable(msg) => write!(f, "cannot read config file: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed config file: {msg}"),
        }
    }
}

impl std::error::Error for ConfigFault {}

impl From<ConfigFault> for Error {
    fn from(e: ConfigFault) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
