//! H.264 decoding via an ffmpeg child process.
//!
//! The elementary stream is piped into ffmpeg's stdin by a pump thread
//! and decoded frames come back as raw RGB24 on stdout. The pump is pure
//! I/O plumbing; analysis stays on the calling thread.

use super::frame::{Frame, BYTES_PER_PIXEL};
use super::source::{read_frame_bytes, DecodeError, FrameSource};
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

/// Decodes a raw H.264 elementary stream into RGB24 frames.
///
/// Frames are scaled by the decoder to the dimensions announced in the
/// stream header, so the output framing is fixed even if the bitstream
/// resolution changes mid-session.
pub struct H264Decoder {
    child: Child,
    stdout: ChildStdout,
    pump: Option<JoinHandle<()>>,
    width: u32,
    height: u32,
    sequence: u64,
    finished: bool,
}

impl H264Decoder {
    /// Spawns the decoder over the given byte stream.
    ///
    /// `input` is consumed on a background pump thread until EOF or until
    /// the decoder exits. `width` and `height` come from the stream
    /// header.
    pub fn spawn<R>(input: R, width: u32, height: u32) -> Result<Self, DecodeError>
    where
        R: Read + Send + 'static,
    {
        let scale_arg = format!("scale={width}:{height}");
        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-fflags")
            .arg("nobuffer")
            .arg("-flags")
            .arg("low_delay")
            .arg("-f")
            .arg("h264")
            .arg("-i")
            .arg("pipe:0")
            .arg("-vf")
            .arg(&scale_arg)
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-f")
            .arg("rawvideo")
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(DecodeError::Spawn)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            DecodeError::Spawn(std::io::Error::other("decoder stdin unavailable"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            DecodeError::Spawn(std::io::Error::other("decoder stdout unavailable"))
        })?;

        // Surface decoder complaints through our own diagnostics.
        if let Some(stderr) = child.stderr.take() {
            std::thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    tracing::warn!(target: "mirror_vision::ffmpeg", "{line}");
                }
            });
        }

        let pump = std::thread::spawn(move || {
            let mut input = input;
            let mut stdin = stdin;
            // A broken pipe here just means the decoder went away first.
            if let Err(e) = std::io::copy(&mut input, &mut stdin) {
                tracing::debug!(error = %e, "stream pump stopped");
            }
        });

        tracing::info!(width, height, "decoder process started");

        Ok(Self {
            child,
            stdout,
            pump: Some(pump),
            width,
            height,
            sequence: 0,
            finished: false,
        })
    }

    /// Checks the exited decoder's status to classify the end of stream.
    fn classify_eof(&mut self) -> Result<(), DecodeError> {
        match self.child.wait() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(DecodeError::Malformed(format!(
                "decoder exited with {status}"
            ))),
            Err(e) => Err(DecodeError::Io(e)),
        }
    }
}

impl FrameSource for H264Decoder {
    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        if self.finished {
            return Ok(None);
        }

        let wanted = (self.width as usize) * (self.height as usize) * BYTES_PER_PIXEL;
        let mut pixels = vec![0u8; wanted];

        match read_frame_bytes(&mut self.stdout, &mut pixels)? {
            0 => {
                self.finished = true;
                self.classify_eof()?;
                Ok(None)
            }
            got if got < wanted => {
                self.finished = true;
                Err(DecodeError::TruncatedFrame { wanted, got })
            }
            _ => {
                self.sequence += 1;
                Ok(Some(Frame::new(
                    pixels,
                    self.width,
                    self.height,
                    self.sequence,
                )))
            }
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for H264Decoder {
    fn drop(&mut self) {
        // Stop the child first so the pump's pipe breaks and it can exit.
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(pump) = self.pump.take() {
            let _ = pump.join();
        }
    }
}
