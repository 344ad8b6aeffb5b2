//! Established session state and the fixed wire records.

use std::io::Read;
use std::net::TcpStream;

/// Length of the null-padded device-name record.
pub const DEVICE_NAME_LEN: usize = 64;
/// Length of the stream header record.
pub const STREAM_HEADER_LEN: usize = 12;

/// Fixed 12-byte header sent on the video channel after the device name.
///
/// The layout is a server-defined binary contract: a 4-byte codec tag
/// followed by the frame width and height as big-endian `u32`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Raw 4-byte codec identifier (e.g. `b"h264"`).
    pub codec_id: [u8; 4],
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl StreamHeader {
    /// Parses the header from its wire representation.
    pub fn parse(bytes: &[u8; STREAM_HEADER_LEN]) -> Self {
        let mut codec_id = [0u8; 4];
        codec_id.copy_from_slice(&bytes[0..4]);
        let width = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let height = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        Self {
            codec_id,
            width,
            height,
        }
    }

    /// Serializes the header back to its wire representation.
    pub fn to_bytes(&self) -> [u8; STREAM_HEADER_LEN] {
        let mut bytes = [0u8; STREAM_HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.codec_id);
        bytes[4..8].copy_from_slice(&self.width.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.height.to_be_bytes());
        bytes
    }

    /// The codec tag as printable text, for diagnostics.
    pub fn codec_tag(&self) -> String {
        self.codec_id
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() {
                    b as char
                } else {
                    '.'
                }
            })
            .collect()
    }
}

/// Decodes the 64-byte device-name record.
///
/// The record is UTF-8 text right-padded with null bytes. Invalid byte
/// sequences are dropped rather than rejected, and the null padding is
/// stripped. Never fails.
pub fn decode_device_name(record: &[u8; DEVICE_NAME_LEN]) -> String {
    String::from_utf8_lossy(record)
        .chars()
        .filter(|&c| c != '\u{FFFD}')
        .collect::<String>()
        .trim_matches('\0')
        .to_string()
}

/// An established session with the mirroring server.
///
/// Holds both channels. The video channel carries the elementary stream
/// from this point on; the control channel is kept open for an external
/// collaborator (device input is out of scope here) but is otherwise
/// unused.
#[derive(Debug)]
pub struct Session {
    pub(crate) video: TcpStream,
    pub(crate) control: TcpStream,
    pub(crate) device_name: String,
    pub(crate) header: StreamHeader,
    pub(crate) ready: bool,
}

impl Session {
    /// Returns true if the full handshake completed.
    ///
    /// A `Session` is only ever constructed ready; the flag exists so
    /// callers can assert the invariant.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The device name reported by the server.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// The stream header reported by the server.
    pub fn header(&self) -> StreamHeader {
        self.header
    }

    /// Consumes the session, yielding a blocking byte reader over the
    /// video channel. The control channel is kept open for the lifetime
    /// of the reader.
    pub fn into_video_reader(self) -> VideoReader {
        // The handshake reads used a timeout; the elementary stream read
        // is unbounded blocking.
        let _ = self.video.set_read_timeout(None);
        VideoReader {
            video: self.video,
            _control: self.control,
        }
    }
}

/// Blocking byte-stream handle over the video channel.
#[derive(Debug)]
pub struct VideoReader {
    video: TcpStream,
    _control: TcpStream,
}

impl Read for VideoReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.video.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn name_record(name: &str) -> [u8; DEVICE_NAME_LEN] {
        let mut record = [0u8; DEVICE_NAME_LEN];
        record[..name.len()].copy_from_slice(name.as_bytes());
        record
    }

    #[test]
    fn test_decode_padded_name() {
        let record = name_record("emulator-5554");
        assert_eq!(decode_device_name(&record), "emulator-5554");
    }

    #[test]
    fn test_decode_full_width_name() {
        let name = "x".repeat(DEVICE_NAME_LEN);
        let record = name_record(&name);
        assert_eq!(decode_device_name(&record), name);
    }

    #[test]
    fn test_decode_invalid_utf8_ignored() {
        let mut record = name_record("pixel");
        record[5] = 0xFF;
        record[6] = 0xFE;
        let decoded = decode_device_name(&record);
        assert_eq!(decoded, "pixel");
    }

    #[test]
    fn test_decode_all_nulls_empty() {
        let record = [0u8; DEVICE_NAME_LEN];
        assert_eq!(decode_device_name(&record), "");
    }

    #[test]
    fn test_header_parse_round_trip() {
        let header = StreamHeader {
            codec_id: *b"h264",
            width: 576,
            height: 1024,
        };
        let parsed = StreamHeader::parse(&header.to_bytes());
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_big_endian_layout() {
        let mut bytes = [0u8; STREAM_HEADER_LEN];
        bytes[0..4].copy_from_slice(b"h264");
        bytes[4..8].copy_from_slice(&[0x00, 0x00, 0x02, 0x40]); // 576
        bytes[8..12].copy_from_slice(&[0x00, 0x00, 0x04, 0x00]); // 1024
        let header = StreamHeader::parse(&bytes);
        assert_eq!(header.width, 576);
        assert_eq!(header.height, 1024);
        assert_eq!(header.codec_tag(), "h264");
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(record in prop::array::uniform32(any::<u8>())) {
            // Extend the 32-byte sample to the full record width.
            let mut full = [0u8; DEVICE_NAME_LEN];
            full[..32].copy_from_slice(&record);
            full[32..].copy_from_slice(&record);
            let decoded = decode_device_name(&full);
            let replacement_char = '\u{FFFD}';
            prop_assert!(!decoded.contains(replacement_char));
        }

        #[test]
        fn prop_valid_names_round_trip(name in "[a-zA-Z0-9_-]{0,64}") {
            let record = name_record(&name);
            prop_assert_eq!(decode_device_name(&record), name);
        }
    }
}
