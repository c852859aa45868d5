//! Parser for the multiplexed log frame format.
//!
//! Each frame on the wire is:
//!
//! ```text
//! [stream type: 1 byte][padding: 3 bytes][payload length: u32 BE][payload]
//! ```
//!
//! Frames arrive strictly in stream order. The stream-type tag distinguishes
//! stdout from stderr, but callers consume the combined text, so both
//! substreams are concatenated as they appear.

use bytes::Buf;

/// Byte length of a frame header.
const HEADER_LEN: usize = 8;

/// Decode a raw log buffer, routing on the source container's TTY flag.
///
/// TTY-attached containers emit an unframed byte stream, which is decoded
/// directly; only non-TTY streams carry the frame format and go through
/// [`demultiplex`].
pub fn decode_stream(raw: &[u8], tty: bool) -> String {
    if tty {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        demultiplex(raw)
    }
}

/// Reassemble a multiplexed log buffer into flat text.
///
/// A trailing partial header, or a final frame whose declared payload length
/// exceeds the remaining bytes, is discarded rather than treated as an error:
/// the runtime's tail and limit options routinely cut the stream mid-frame.
/// Payload bytes are decoded as UTF-8 with invalid sequences replaced.
pub fn demultiplex(buf: &[u8]) -> String {
    let mut cursor = buf;
    let mut text = String::new();

    while cursor.remaining() >= HEADER_LEN {
        // Stream-type tag, then three bytes of padding.
        let _stream_type = cursor.get_u8();
        cursor.advance(3);
        let payload_len = cursor.get_u32() as usize;

        if cursor.remaining() < payload_len {
            // Truncated final frame.
            break;
        }

        let payload = cursor.copy_to_bytes(payload_len);
        text.push_str(&String::from_utf8_lossy(&payload));
    }

    text
}
