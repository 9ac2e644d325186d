//! Workload implementations for the workload generator
//!
//! This module provides the four worker load shapes, the spinner they share,
//! and the start barrier and context that run them together.

pub mod barrier;
pub mod batch;
pub mod context;
pub mod interactive;
pub mod model;
pub mod params;
pub mod periodic;
pub mod spinner;
pub mod worker;
pub mod yielding;
