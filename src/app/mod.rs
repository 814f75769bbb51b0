//! Application core: costume logic, no direct I/O.
//!
//! The state machine, its state and its strategies live here.  All
//! interaction with hardware happens through the port traits in [`ports`],
//! keeping this layer testable without real peripherals.

pub mod events;
pub mod machine;
pub mod phrase;
pub mod ports;
pub mod state;
