//! Frame loop controller.

use super::sink::FrameSink;
use super::stats::{LoopStats, StageTimings};
use crate::analysis::{AnalysisError, MaskPostProcessor, MaskProducer};
use crate::decode::{DecodeError, FrameSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Fatal errors that terminate the frame loop.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The external stop flag was raised (e.g. an interrupt).
    Stopped,
    /// The sink requested a stop.
    SinkClosed,
    /// The frame sequence ended cleanly.
    EndOfStream,
    /// The configured frame budget was reached.
    FrameLimit,
}

/// Drives the per-frame cycle: pull frame, run the selected analysis
/// path, post-process, present, poll the stop flag.
///
/// Candidate extraction runs on the adaptive path; the static reference
/// path hands its mask to the sink as-is, leaving masking or
/// highlighting policy to the caller.
pub struct FrameLoopController {
    producer: MaskProducer,
    post: MaskPostProcessor,
    min_area: u32,
    max_frames: Option<u64>,
    stop: Arc<AtomicBool>,
    /// Log accumulated timings every this many frames.
    report_every: u64,
}

impl FrameLoopController {
    pub fn new(
        producer: MaskProducer,
        post: MaskPostProcessor,
        min_area: u32,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            producer,
            post,
            min_area,
            max_frames: None,
            stop,
            report_every: 120,
        }
    }

    /// Limits the run to at most `frames` frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Runs the loop until a stop condition or a fatal error.
    ///
    /// A long-blocking frame pull cannot be interrupted mid-read; the
    /// stop flag takes effect once the pull returns.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> Result<(LoopStats, ExitReason), PipelineError> {
        let mut stats = LoopStats::default();
        tracing::info!(
            strategy = self.producer.kind(),
            min_area = self.min_area,
            "frame loop starting"
        );

        let reason = loop {
            if self.stop.load(Ordering::Relaxed) {
                break ExitReason::Stopped;
            }
            if let Some(limit) = self.max_frames {
                if stats.frames >= limit {
                    break ExitReason::FrameLimit;
                }
            }

            let iteration_start = Instant::now();
            let Some(frame) = source.next_frame()? else {
                break ExitReason::EndOfStream;
            };
            let decode = iteration_start.elapsed();

            let analyze_start = Instant::now();
            let mask = self.producer.mask_for(&frame)?;
            let candidates = match self.producer {
                MaskProducer::Adaptive(_) => self.post.extract(&mask, self.min_area),
                MaskProducer::Static(_) => Vec::new(),
            };
            let analyze = analyze_start.elapsed();

            let render_start = Instant::now();
            let keep_going = sink.present(&frame, &mask, &candidates);
            let render = render_start.elapsed();

            stats.record(
                StageTimings {
                    decode,
                    analyze,
                    render,
                    total: iteration_start.elapsed(),
                },
                candidates.len(),
            );

            if stats.frames % self.report_every == 0 {
                tracing::info!(
                    frames = stats.frames,
                    candidates = stats.candidates,
                    mean_frame_ms = stats
                        .mean_frame_time()
                        .map(|d| d.as_millis() as u64)
                        .unwrap_or(0),
                    "frame loop progress"
                );
            }

            if !keep_going {
                break ExitReason::SinkClosed;
            }
        };

        tracing::info!(
            frames = stats.frames,
            candidates = stats.candidates,
            reason = ?reason,
            "frame loop finished"
        );
        Ok((stats, reason))
    }
}
