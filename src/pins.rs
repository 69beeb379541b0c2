//! GPIO pin assignments for the ESP32-S3 DevKit.
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED, toggled at the current blink interval.
pub const LED_GPIO: i32 = 48;

// ---------------------------------------------------------------------------
// User button (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// BOOT button; each debounced press advances the blink interval.
pub const BUTTON_GPIO: i32 = 0;

/// Level sampling period for the button (milliseconds).
pub const BUTTON_POLL_MS: u32 = 20;
