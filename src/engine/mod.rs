pub mod attendance;
pub mod clock;
pub mod error;
pub mod interval;
pub mod leave;
pub mod overlap;
pub mod policy;
pub mod stats;

#[cfg(test)]
mod lifecycle_tests;

pub use attendance::{AttendanceEngine, ShiftRules};
pub use clock::{Clock, SystemClock};
pub use error::EngineError;
pub use leave::{LeaveEngine, LeavePatch};
pub use policy::{Caller, LeaveAction};
