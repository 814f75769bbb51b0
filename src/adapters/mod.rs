//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                          | Connects to            |
//! |------------|-------------------------------------|------------------------|
//! | `log_sink` | EventSink                           | `log` facade           |
//! | `time`     | -                                   | monotonic clock        |
//! | `rpi`      | InputPin, OutputPin, SetDutyCycle   | rppal GPIO (`rpi`)     |
//! | `audio`    | AudioPlayer                         | cpal + symphonia (`audio`) |

#[cfg(feature = "audio")]
pub mod audio;
pub mod log_sink;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod time;
