//! Clock, scheduler and logging utilities.

pub mod clock;
pub mod logging;
pub mod sched;
