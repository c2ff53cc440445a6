//! Minecraft Java edition status protocol framing
//!
//! Every packet is `VarInt length | VarInt packet id | payload`. Strings are
//! a VarInt byte length followed by UTF-8.

use std::io;

use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Protocol version sent in the handshake. Servers answer status requests
/// regardless of the version they actually speak.
pub const HANDSHAKE_PROTOCOL_VERSION: i32 = 47;

/// Upper bound for an incoming packet (the protocol's own 3-byte length limit)
pub const MAX_PACKET_LEN: usize = 2 * 1024 * 1024;

const STATUS_NEXT_STATE: i32 = 1;
const HANDSHAKE_PACKET_ID: i32 = 0x00;
const STATUS_PACKET_ID: i32 = 0x00;

/// Errors while decoding a status response
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("VarInt is longer than 5 bytes")]
    VarIntTooLong,

    #[error("packet length {0} out of range")]
    BadLength(i64),

    #[error("unexpected packet id {0:#x}")]
    UnexpectedPacket(i32),

    #[error("response is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid status json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Append `value` as a VarInt
pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7f == 0 {
            buf.push(value as u8);
            return;
        }
        buf.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
}

/// Decode a VarInt from the front of `bytes`, returning the value and the
/// number of bytes consumed
pub fn decode_varint(bytes: &[u8]) -> Result<(i32, usize), FrameError> {
    let mut value: u32 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if i >= 5 {
            return Err(FrameError::VarIntTooLong);
        }
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value as i32, i + 1));
        }
    }

    if bytes.len() >= 5 {
        Err(FrameError::VarIntTooLong)
    } else {
        Err(FrameError::Io(io::ErrorKind::UnexpectedEof.into()))
    }
}

/// Read a VarInt from an async stream
pub async fn read_varint<R>(reader: &mut R) -> Result<i32, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(FrameError::VarIntTooLong)
}

fn write_string(buf: &mut Vec<u8>, value: &str) {
    write_varint(buf, value.len() as i32);
    buf.extend_from_slice(value.as_bytes());
}

fn frame(packet_id: i32, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(payload.len() + 1);
    write_varint(&mut body, packet_id);
    body.extend_from_slice(payload);

    let mut packet = Vec::with_capacity(body.len() + 3);
    write_varint(&mut packet, body.len() as i32);
    packet.extend_from_slice(&body);
    packet
}

/// Handshake packet switching the connection into the status state
pub fn handshake_packet(host: &str, port: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(host.len() + 8);
    write_varint(&mut payload, HANDSHAKE_PROTOCOL_VERSION);
    write_string(&mut payload, host);
    payload.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut payload, STATUS_NEXT_STATE);
    frame(HANDSHAKE_PACKET_ID, &payload)
}

/// Empty status request packet
pub fn status_request_packet() -> Vec<u8> {
    frame(STATUS_PACKET_ID, &[])
}

/// Read one length-prefixed packet body (packet id + payload)
pub async fn read_packet<R>(reader: &mut R) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let len = read_varint(reader).await?;
    if len <= 0 || len as usize > MAX_PACKET_LEN {
        return Err(FrameError::BadLength(len as i64));
    }

    let mut body = vec![0; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Decode the JSON document carried by a status response body
pub fn decode_status_response(body: &[u8]) -> Result<StatusResponse, FrameError> {
    let (packet_id, consumed) = decode_varint(body)?;
    if packet_id != STATUS_PACKET_ID {
        return Err(FrameError::UnexpectedPacket(packet_id));
    }

    let rest = &body[consumed..];
    let (json_len, consumed) = decode_varint(rest)?;
    if json_len < 0 || json_len as usize > rest.len() - consumed {
        return Err(FrameError::BadLength(json_len as i64));
    }

    let json = &rest[consumed..consumed + json_len as usize];
    let json = std::str::from_utf8(json).map_err(|_| FrameError::InvalidUtf8)?;

    Ok(serde_json::from_str(json)?)
}

/// The parts of the status document the monitor cares about
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub players: StatusPlayers,
    #[serde(default)]
    pub version: Option<StatusVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPlayers {
    pub online: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}
