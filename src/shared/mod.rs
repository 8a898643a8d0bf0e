pub mod clock;
pub mod error;
pub mod result;
pub mod security;

pub use clock::{Clock, ManualClock, SystemClock};
pub use result::Result;
