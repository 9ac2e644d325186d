//! A synthetic CPU workload mix generator.
//!
//! Workers of four kinds (batch, interactive, periodic and yielding) each run on
//! their own thread. They are all released from a start barrier at the same
//! instant, so an external profiler can line its measurements up with the
//! start of the test, and all stop once the test duration has elapsed.

pub mod config;
pub mod util;
pub mod workloads;
