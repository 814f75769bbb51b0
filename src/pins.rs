//! Default GPIO assignments for the costume harness (BCM numbering).
//!
//! These are the factory wiring; [`CostumeConfig`](crate::config::CostumeConfig)
//! starts from them and a config file may override any of them.

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Wing servo signal.  GPIO18 is PWM0 on every 40-pin board.
pub const SERVO_GPIO: u8 = 18;
/// Wing strobe LEDs (via transistor).
pub const STROBE_LED_GPIO: u8 = 23;
/// Wrist laser LED.
pub const LASER_LED_GPIO: u8 = 24;

// ---------------------------------------------------------------------------
// Buttons (active-low with internal pull-up)
// ---------------------------------------------------------------------------

pub const WING_BUTTON_GPIO: u8 = 17;
pub const LASER_BUTTON_GPIO: u8 = 27;
pub const PHRASE_BUTTON_GPIO: u8 = 22;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby servos expect a 20 ms frame.
pub const SERVO_PWM_FREQ_HZ: f64 = 50.0;

/// Highest BCM pin routed to the 40-pin header.
pub const MAX_BCM_GPIO: u8 = 27;
