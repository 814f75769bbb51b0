//! Output and input drivers built on the port traits.
//!
//! Each driver owns exactly one line (or set of lines) and knows nothing
//! about the costume state; [`crate::app::machine`] decides what to drive.

pub mod button;
pub mod servo;
pub mod sound;
pub mod strobe;
