use std::io::{self, Read, Write};

use super::protocol::SessionMessage;

/// Upper bound on a single framed message. The map payload dominates;
/// anything larger than this is a corrupt or hostile frame.
pub const MAX_FRAME_SIZE: usize = 256 * 1024;

/// Write one length-prefixed message to a reliable stream. The prefix and
/// body leave in a single write.
pub fn write_message<W: Write>(writer: &mut W, message: &SessionMessage) -> io::Result<()> {
    let data = message.encode().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("serialization error: {}", e),
        )
    })?;

    if data.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds size limit",
        ));
    }

    let mut frame = Vec::with_capacity(4 + data.len());
    frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
    frame.extend_from_slice(&data);
    writer.write_all(&frame)?;
    writer.flush()
}

/// Read one length-prefixed message from a reliable stream. A peer that
/// closes the stream between frames surfaces as `UnexpectedEof`.
///
/// A read deadline that fires mid-frame discards the bytes already
/// consumed, so a stream read under a timeout must be dropped after any
/// error rather than polled again.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<SessionMessage> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;

    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds size limit",
        ));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    SessionMessage::decode(&data).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("deserialization error: {}", e),
        )
    })
}
