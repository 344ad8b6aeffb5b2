//! Per-stage timing measurements.
//!
//! Observational only: nothing here ever feeds back into control flow.

use std::time::Duration;

/// Wall-clock duration of each stage of one loop iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    /// Waiting for and decoding the next frame.
    pub decode: Duration,
    /// Mask production and candidate extraction.
    pub analyze: Duration,
    /// Sink presentation.
    pub render: Duration,
    /// Whole iteration.
    pub total: Duration,
}

/// Accumulated statistics for a finished (or aborted) loop run.
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    /// Frames fully processed.
    pub frames: u64,
    /// Candidate objects emitted across all frames.
    pub candidates: u64,
    /// Summed stage timings.
    pub decode: Duration,
    pub analyze: Duration,
    pub render: Duration,
    pub total: Duration,
}

impl LoopStats {
    /// Folds one iteration into the totals.
    pub fn record(&mut self, timings: StageTimings, candidates: usize) {
        self.frames += 1;
        self.candidates += candidates as u64;
        self.decode += timings.decode;
        self.analyze += timings.analyze;
        self.render += timings.render;
        self.total += timings.total;
    }

    /// Mean full-iteration duration, if any frames were processed.
    pub fn mean_frame_time(&self) -> Option<Duration> {
        (self.frames > 0).then(|| self.total / self.frames as u32)
    }
}
