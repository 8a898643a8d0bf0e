//! Per-client request admission control.
mod request_throttle;

pub use request_throttle::{RequestThrottle, ThrottleDecision, ThrottleLimits, ThrottleWindow};
