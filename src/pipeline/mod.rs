//! The per-frame drive loop.
//!
//! Single-threaded and cooperative: each iteration fully completes
//! decode, analysis and presentation before the next begins, and the
//! stop signal is polled once per frame. This is the only place in the
//! crate aware of wall-clock time and termination.

mod controller;
mod sink;
mod stats;

pub use controller::{ExitReason, FrameLoopController, PipelineError};
pub use sink::{FrameSink, NullSink, TracingSink};
pub use stats::{LoopStats, StageTimings};
