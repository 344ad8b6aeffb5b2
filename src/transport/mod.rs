//! Stream negotiation with the mirroring server.
//!
//! The server speaks a dual-channel protocol over loopback TCP: the first
//! connection becomes the video channel, the second the control channel,
//! distinguished purely by arrival order. The video channel then carries a
//! 64-byte device-name record, a 12-byte stream header, and finally the raw
//! elementary video stream.

mod config;
mod handshake;
mod session;

pub use config::TransportConfig;
pub use handshake::{connect, Handshake, HandshakeStage, HandshakeState, TransportError};
pub use session::{
    decode_device_name, Session, StreamHeader, VideoReader, DEVICE_NAME_LEN, STREAM_HEADER_LEN,
};
