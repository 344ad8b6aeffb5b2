//! Mirror Vision Library
//!
//! Ingests a live screen-mirroring video stream from a mobile device
//! over loopback TCP, decodes it into frames, and extracts a structured
//! approximation of on-screen game state by background subtraction.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! transport → decode → analysis (static reference | adaptive model)
//!                          ↓
//!                    post-processing → candidate objects
//!                          ↓
//!                       pipeline (timing, termination)
//! ```
//!
//! # Design Principles
//!
//! - **Explicit protocol states**: the handshake is a named state
//!   machine, each transition independently testable
//! - **No hidden tuning**: every threshold lives in a passed-in
//!   configuration record with documented defaults
//! - **Whole frames or nothing**: a malformed or truncated bitstream
//!   terminates the sequence; no partial frame is ever delivered
//! - **Single-threaded analysis**: one cooperative loop, stop signal
//!   polled once per frame
//!
//! # Example
//!
//! ```no_run
//! use mirror_vision::{
//!     analysis::{AdaptiveBackgroundModel, AdaptiveConfig, MaskPostProcessor, MaskProducer},
//!     decode::RawFrameSource,
//!     pipeline::{FrameLoopController, TracingSink},
//! };
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! let file = std::fs::File::open("frames.rgb24").unwrap();
//! let mut source = RawFrameSource::new(file, 576, 1024);
//!
//! let producer = MaskProducer::Adaptive(AdaptiveBackgroundModel::new(AdaptiveConfig::default()));
//! let stop = Arc::new(AtomicBool::new(false));
//! let mut controller =
//!     FrameLoopController::new(producer, MaskPostProcessor::new(2), 200, stop);
//!
//! let mut sink = TracingSink;
//! let (stats, reason) = controller.run(&mut source, &mut sink).unwrap();
//! println!("{} frames, exited: {:?}", stats.frames, reason);
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod decode;
pub mod pipeline;
pub mod transport;

// Re-export commonly used types at crate root
pub use analysis::{
    AdaptiveBackgroundModel, AnalysisConfig, CandidateObject, MaskPostProcessor, MaskProducer,
    ReferenceModel, Roi,
};
pub use config::{AnalysisMode, ConfigError, FileConfig};
pub use decode::{DecodeError, Frame, FrameSource, H264Decoder, RawFrameSource};
pub use pipeline::{ExitReason, FrameLoopController, FrameSink, LoopStats};
pub use transport::{Session, StreamHeader, TransportConfig, TransportError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
