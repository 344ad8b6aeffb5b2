//! Connect/handshake state machine.
//!
//! The handshake is an explicit progression of named states, one fallible
//! transition per protocol step:
//!
//! ```text
//! Disconnected → VideoConnected → ControlConnected → MetadataRead
//!              → HeaderRead → Ready
//! ```
//!
//! Every error records the stage it occurred at. There is no automatic
//! retry; a failed handshake drops any sockets opened so far and the
//! caller decides whether to attempt a fresh one.

use super::config::TransportConfig;
use super::session::{
    decode_device_name, Session, StreamHeader, DEVICE_NAME_LEN, STREAM_HEADER_LEN,
};
use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use thiserror::Error;

/// Protocol step at which a transport error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// Opening the first TCP connection (video channel).
    VideoConnect,
    /// Opening the second TCP connection (control channel).
    ControlConnect,
    /// Reading the 64-byte device-name record.
    DeviceName,
    /// Reading the 12-byte stream header record.
    StreamHeader,
}

impl std::fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::VideoConnect => "video-connect",
            Self::ControlConnect => "control-connect",
            Self::DeviceName => "device-name",
            Self::StreamHeader => "stream-header",
        };
        f.write_str(name)
    }
}

/// Errors raised while establishing a session.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed at {stage}: {source}")]
    Connect {
        stage: HandshakeStage,
        #[source]
        source: std::io::Error,
    },

    #[error("read timed out at {stage}")]
    Timeout { stage: HandshakeStage },

    /// A fixed-size record came up short. A short stream header is fatal:
    /// without the full header the decoder cannot size frames, so a
    /// "ready" session would be meaningless.
    #[error("short read at {stage}: wanted {wanted} bytes, got {got}")]
    ShortRead {
        stage: HandshakeStage,
        wanted: usize,
        got: usize,
    },

    #[error("i/o error at {stage}: {source}")]
    Io {
        stage: HandshakeStage,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// The protocol step this error occurred at.
    pub fn stage(&self) -> HandshakeStage {
        match self {
            Self::Connect { stage, .. }
            | Self::Timeout { stage }
            | Self::ShortRead { stage, .. }
            | Self::Io { stage, .. } => *stage,
        }
    }
}

/// Named handshake states. Sockets live inside the state they were opened
/// in, so abandoning a state at any point closes them.
#[derive(Debug)]
pub enum HandshakeState {
    Disconnected,
    VideoConnected {
        video: TcpStream,
    },
    ControlConnected {
        video: TcpStream,
        control: TcpStream,
    },
    MetadataRead {
        video: TcpStream,
        control: TcpStream,
        device_name: String,
    },
    HeaderRead {
        video: TcpStream,
        control: TcpStream,
        device_name: String,
        header: StreamHeader,
    },
    Ready(Session),
}

impl HandshakeState {
    /// Short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::VideoConnected { .. } => "video-connected",
            Self::ControlConnected { .. } => "control-connected",
            Self::MetadataRead { .. } => "metadata-read",
            Self::HeaderRead { .. } => "header-read",
            Self::Ready(_) => "ready",
        }
    }

    /// Returns true once the full handshake has completed.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Performs one protocol step, consuming this state.
    ///
    /// On error the consumed state (and any sockets it held) is dropped,
    /// so a failed handshake never leaks connections.
    pub fn advance(self, config: &TransportConfig) -> Result<HandshakeState, TransportError> {
        match self {
            Self::Disconnected => {
                let video = connect_channel(config, HandshakeStage::VideoConnect)?;
                video
                    .set_read_timeout(Some(config.read_timeout()))
                    .map_err(|source| TransportError::Io {
                        stage: HandshakeStage::VideoConnect,
                        source,
                    })?;
                tracing::debug!("video channel connected");
                Ok(Self::VideoConnected { video })
            }
            Self::VideoConnected { video } => {
                // Minimum delay, required so the server can attribute the
                // two connections by arrival order.
                std::thread::sleep(config.handshake_delay());
                let control = connect_channel(config, HandshakeStage::ControlConnect)?;
                tracing::debug!("control channel connected");
                Ok(Self::ControlConnected { video, control })
            }
            Self::ControlConnected { mut video, control } => {
                let device_name = read_device_name(&mut video)?;
                tracing::debug!(device = %device_name, "device metadata read");
                Ok(Self::MetadataRead {
                    video,
                    control,
                    device_name,
                })
            }
            Self::MetadataRead {
                mut video,
                control,
                device_name,
            } => {
                let header = read_stream_header(&mut video)?;
                tracing::debug!(
                    codec = %header.codec_tag(),
                    width = header.width,
                    height = header.height,
                    "stream header read"
                );
                Ok(Self::HeaderRead {
                    video,
                    control,
                    device_name,
                    header,
                })
            }
            Self::HeaderRead {
                video,
                control,
                device_name,
                header,
            } => Ok(Self::Ready(Session {
                video,
                control,
                device_name,
                header,
                ready: true,
            })),
            ready @ Self::Ready(_) => Ok(ready),
        }
    }
}

/// Drives the handshake state machine to completion.
pub struct Handshake {
    config: TransportConfig,
}

impl Handshake {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Runs all transitions and returns the established session.
    pub fn run(self) -> Result<Session, TransportError> {
        let mut state = HandshakeState::Disconnected;
        loop {
            match state.advance(&self.config)? {
                HandshakeState::Ready(session) => return Ok(session),
                next => {
                    tracing::trace!(state = next.name(), "handshake advanced");
                    state = next;
                }
            }
        }
    }
}

/// Connects to the mirroring server and performs the full handshake.
pub fn connect(config: &TransportConfig) -> Result<Session, TransportError> {
    let session = Handshake::new(config.clone()).run()?;
    tracing::info!(
        device = %session.device_name(),
        codec = %session.header().codec_tag(),
        width = session.header().width,
        height = session.header().height,
        "session established"
    );
    Ok(session)
}

fn connect_channel(
    config: &TransportConfig,
    stage: HandshakeStage,
) -> Result<TcpStream, TransportError> {
    let addrs = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Connect { stage, source })?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(stream) => {
                stream
                    .set_nodelay(true)
                    .map_err(|source| TransportError::Io { stage, source })?;
                return Ok(stream);
            }
            Err(source) => last_err = Some(source),
        }
    }
    let source = last_err.unwrap_or_else(|| {
        std::io::Error::new(ErrorKind::AddrNotAvailable, "no addresses resolved")
    });
    Err(TransportError::Connect { stage, source })
}

/// Reads the 64-byte device-name record from the video channel.
pub(crate) fn read_device_name<R: Read>(reader: &mut R) -> Result<String, TransportError> {
    let mut record = [0u8; DEVICE_NAME_LEN];
    read_record(reader, &mut record, HandshakeStage::DeviceName)?;
    Ok(decode_device_name(&record))
}

/// Reads and parses the 12-byte stream header from the video channel.
pub(crate) fn read_stream_header<R: Read>(reader: &mut R) -> Result<StreamHeader, TransportError> {
    let mut record = [0u8; STREAM_HEADER_LEN];
    read_record(reader, &mut record, HandshakeStage::StreamHeader)?;
    Ok(StreamHeader::parse(&record))
}

/// Reads an exact-size record, reporting how many bytes arrived if the
/// peer closed early.
fn read_record<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    stage: HandshakeStage,
) -> Result<(), TransportError> {
    let wanted = buf.len();
    let mut got = 0;
    while got < wanted {
        match reader.read(&mut buf[got..]) {
            Ok(0) => return Err(TransportError::ShortRead { stage, wanted, got }),
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Err(TransportError::Timeout { stage })
            }
            Err(source) => return Err(TransportError::Io { stage, source }),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_device_name_from_record() {
        let mut record = vec![0u8; DEVICE_NAME_LEN];
        record[..7].copy_from_slice(b"pixel-7");
        let mut cursor = Cursor::new(record);

        let name = read_device_name(&mut cursor).unwrap();
        assert_eq!(name, "pixel-7");
    }

    #[test]
    fn test_short_device_record_reports_stage_and_count() {
        let mut cursor = Cursor::new(vec![b'x'; 10]);
        let err = read_device_name(&mut cursor).unwrap_err();

        match err {
            TransportError::ShortRead { stage, wanted, got } => {
                assert_eq!(stage, HandshakeStage::DeviceName);
                assert_eq!(wanted, DEVICE_NAME_LEN);
                assert_eq!(got, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_header_is_fatal() {
        // 8 of 12 bytes, then EOF.
        let mut cursor = Cursor::new(vec![0u8; 8]);
        let err = read_stream_header(&mut cursor).unwrap_err();

        assert_eq!(err.stage(), HandshakeStage::StreamHeader);
        assert!(matches!(err, TransportError::ShortRead { got: 8, .. }));
    }

    #[test]
    fn test_header_parsed_from_stream() {
        let header = StreamHeader {
            codec_id: *b"h264",
            width: 576,
            height: 1024,
        };
        let mut cursor = Cursor::new(header.to_bytes().to_vec());

        let parsed = read_stream_header(&mut cursor).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_record_read_tolerates_fragmentation() {
        // A reader that returns one byte at a time.
        struct OneByte(Vec<u8>, usize);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.1 >= self.0.len() {
                    return Ok(0);
                }
                buf[0] = self.0[self.1];
                self.1 += 1;
                Ok(1)
            }
        }

        let mut record = vec![0u8; DEVICE_NAME_LEN];
        record[..4].copy_from_slice(b"slow");
        let mut reader = OneByte(record, 0);

        assert_eq!(read_device_name(&mut reader).unwrap(), "slow");
    }

    #[test]
    fn test_disconnected_state_name() {
        assert_eq!(HandshakeState::Disconnected.name(), "disconnected");
        assert!(!HandshakeState::Disconnected.is_ready());
    }
}
