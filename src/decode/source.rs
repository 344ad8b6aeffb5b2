//! Frame source abstraction.
//!
//! Mirrors the trait seam used for the transport: the loop controller
//! only ever sees a `FrameSource`, so the live decoder and the
//! pre-decoded test/file source are interchangeable.

use super::frame::{Frame, BYTES_PER_PIXEL};
use std::io::{ErrorKind, Read};
use thiserror::Error;

/// Errors raised while decoding the elementary stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to spawn decoder process: {0}")]
    Spawn(std::io::Error),

    /// The stream ended inside a frame. The partial frame is discarded.
    #[error("stream ended mid-frame: wanted {wanted} bytes, got {got}")]
    TruncatedFrame { wanted: usize, got: usize },

    #[error("malformed bitstream: {0}")]
    Malformed(String),

    #[error("i/o error reading decoded frames: {0}")]
    Io(#[from] std::io::Error),
}

/// A lazy, unbounded, non-restartable sequence of decoded frames.
pub trait FrameSource {
    /// Pulls the next frame, blocking until one is available.
    ///
    /// Returns `Ok(None)` when the underlying stream ends cleanly at a
    /// frame boundary. An error terminates the sequence; callers must not
    /// pull again after one.
    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError>;

    /// Frame dimensions produced by this source.
    fn dimensions(&self) -> (u32, u32);
}

/// Frame source over pre-decoded RGB24 data.
///
/// Reads `width * height * 3` bytes per frame from any reader. Used for
/// tests and for offline analysis of already-decoded recordings.
pub struct RawFrameSource<R> {
    reader: R,
    width: u32,
    height: u32,
    sequence: u64,
}

impl<R: Read> RawFrameSource<R> {
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader,
            width,
            height,
            sequence: 0,
        }
    }
}

impl<R: Read> FrameSource for RawFrameSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        let wanted = (self.width as usize) * (self.height as usize) * BYTES_PER_PIXEL;
        let mut pixels = vec![0u8; wanted];

        match read_frame_bytes(&mut self.reader, &mut pixels)? {
            0 => Ok(None),
            got if got < wanted => Err(DecodeError::TruncatedFrame { wanted, got }),
            _ => {
                self.sequence += 1;
                Ok(Some(Frame::new(pixels, self.width, self.height, self.sequence)))
            }
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Fills `buf` from the reader, tolerating arbitrary chunk boundaries.
///
/// Returns the number of bytes actually read; fewer than `buf.len()`
/// means the stream ended.
pub(crate) fn read_frame_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(got)
}
