//! VarInt framing used by the server list ping protocol
//!
//! Every packet is `VarInt length | VarInt packet id | payload`, where the
//! length covers the id and the payload.

use crate::error::{ProtocolError, Result};
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest frame accepted from a server. Status responses carry a base64
/// favicon, so this is well above typical sizes.
pub const MAX_FRAME_LEN: usize = 2 * 1024 * 1024;

const SEGMENT_BITS: u32 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Append `value` as a VarInt (two's complement for negatives).
pub fn put_varint(buf: &mut BytesMut, value: i32) {
    let mut value = value.cast_unsigned();
    loop {
        if value & !SEGMENT_BITS == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & SEGMENT_BITS) as u8 | CONTINUE_BIT);
        value >>= 7;
    }
}

/// Append a VarInt-prefixed UTF-8 string.
pub fn put_string(buf: &mut BytesMut, value: &str) -> Result<()> {
    let len = i32::try_from(value.len())
        .map_err(|_| ProtocolError::Parse("string too long for VarInt prefix".to_string()))?;
    put_varint(buf, len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Decode a VarInt from the front of `input`.
///
/// Returns the value and the number of bytes consumed.
pub fn get_varint(input: &[u8]) -> Result<(i32, usize)> {
    let mut value: u32 = 0;
    for (i, byte) in input.iter().enumerate().take(5) {
        value |= (u32::from(*byte) & SEGMENT_BITS) << (7 * i);
        if byte & CONTINUE_BIT == 0 {
            return Ok((value.cast_signed(), i + 1));
        }
    }

    if input.len() >= 5 {
        Err(ProtocolError::Parse("VarInt is longer than 5 bytes".to_string()))
    } else {
        Err(ProtocolError::Parse("truncated VarInt".to_string()))
    }
}

/// Read a VarInt byte by byte from a stream.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= (u32::from(byte) & SEGMENT_BITS) << (7 * i);
        if byte & CONTINUE_BIT == 0 {
            return Ok(value.cast_signed());
        }
    }
    Err(ProtocolError::Parse("VarInt is longer than 5 bytes".to_string()))
}

/// Frame a packet: length prefix, packet id, payload.
pub fn encode_frame(packet_id: i32, payload: &[u8]) -> Result<BytesMut> {
    let mut body = BytesMut::with_capacity(payload.len() + 5);
    put_varint(&mut body, packet_id);
    body.put_slice(payload);

    let len = i32::try_from(body.len())
        .map_err(|_| ProtocolError::Parse("packet too long for VarInt prefix".to_string()))?;
    let mut frame = BytesMut::with_capacity(body.len() + 5);
    put_varint(&mut frame, len);
    frame.put_slice(&body);
    Ok(frame)
}

/// Read one frame and split it into packet id and payload.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(i32, Vec<u8>)> {
    let len = read_varint(reader).await?;
    let len = usize::try_from(len)
        .map_err(|_| ProtocolError::Parse(format!("negative frame length {len}")))?;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::PacketTooLarge {
            size: len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    let (packet_id, consumed) = get_varint(&body)?;
    let payload = body.split_off(consumed);
    Ok((packet_id, payload))
}

/// Decode a VarInt-prefixed string from the front of `payload`.
pub fn get_string(payload: &[u8]) -> Result<String> {
    let (len, consumed) = get_varint(payload)?;
    let len = usize::try_from(len)
        .map_err(|_| ProtocolError::Parse(format!("negative string length {len}")))?;
    let bytes = payload
        .get(consumed..consumed + len)
        .ok_or_else(|| ProtocolError::Parse("string extends past end of packet".to_string()))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ProtocolError::Parse(format!("Invalid UTF-8 in string: {e}")))
}
