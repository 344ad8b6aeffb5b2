//! Elementary-stream decoding into RGB frames.
//!
//! The transport hands over a raw, containerless H.264 bitstream. This
//! module turns it into a lazy, non-restartable sequence of fixed-layout
//! frames. A malformed or truncated bitstream terminates the sequence
//! with an error; no partial frame is ever emitted.

mod ffmpeg;
mod frame;
mod source;

pub use ffmpeg::H264Decoder;
pub use frame::Frame;
pub use source::{DecodeError, FrameSource, RawFrameSource};
