//! Costume controller library.
//!
//! Everything except the Raspberry Pi GPIO and audio-device adapters is
//! pure logic over the `embedded-hal` traits, so the whole state machine
//! runs on a development host against mock pins.  The Pi adapters are
//! gated behind the `rpi` and `audio` features.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod pins;
pub mod supervisor;
