//! Length-prefixed binary framing for the backend IPC channel.
//!
//! Wire layout of a request frame (all integers little-endian):
//!
//! ```text
//! total_length : u32
//! type_len     : u32   type : bytes[type_len]
//! path_len     : u32   path : bytes[path_len]
//! x_param      : i32
//! y_param      : i32
//! data_len     : u32   data : bytes[data_len]
//! ```
//!
//! `total_length` counts every byte from `type_len` onward. A response is
//! just `response_len : u32` followed by exactly that many bytes; there is
//! no verb echo.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::ProtocolError;

/// Sanity cap on any single declared length. Real frames never approach
/// this; it exists only to turn a corrupt or malicious length prefix into a
/// fast `ProtocolError` instead of an attempted multi-gigabyte allocation.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Encode one request frame as described in the module docs.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidField`] if `verb` is empty or not ASCII,
/// if `path` is not valid UTF-8 input (it is always `&str` here, so this
/// only rejects emptiness), or if `data` exceeds `i32::MAX` bytes.
pub fn encode_request(
    verb: &str,
    path: &str,
    x_param: i32,
    y_param: i32,
    data: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    if verb.is_empty() || !verb.is_ascii() {
        return Err(ProtocolError::InvalidField {
            field: "type",
            reason: "must be non-empty ASCII".to_owned(),
        });
    }
    if data.len() > i32::MAX as usize {
        return Err(ProtocolError::InvalidField {
            field: "data",
            reason: format!("{} bytes exceeds the 2^31-1 limit", data.len()),
        });
    }

    let type_bytes = verb.as_bytes();
    let path_bytes = path.as_bytes();

    let body_len = 4 + type_bytes.len() + 4 + path_bytes.len() + 4 + 4 + 4 + data.len();

    let mut out = Vec::with_capacity(4 + body_len);
    out.write_u32::<LittleEndian>(body_len as u32)
        .expect("writes to a Vec never fail");

    out.write_u32::<LittleEndian>(type_bytes.len() as u32).unwrap();
    out.write_all(type_bytes).unwrap();

    out.write_u32::<LittleEndian>(path_bytes.len() as u32).unwrap();
    out.write_all(path_bytes).unwrap();

    out.write_i32::<LittleEndian>(x_param).unwrap();
    out.write_i32::<LittleEndian>(y_param).unwrap();

    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_all(data).unwrap();

    Ok(out)
}

/// Read one length-prefixed response blob from `reader`.
///
/// Either the full frame is read, or a [`ProtocolError`] is returned and the
/// stream must be considered desynchronised (the caller poisons its client).
pub fn decode_response(reader: &mut impl Read) -> Result<Vec<u8>, ProtocolError> {
    let response_len = read_u32(reader)? as usize;

    if response_len > MAX_FRAME_LEN {
        return Err(ProtocolError::TooLarge {
            declared: response_len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut buf = vec![0u8; response_len];
    read_exact_or_truncated(reader, &mut buf, response_len)?;
    Ok(buf)
}

fn read_u32(reader: &mut impl Read) -> Result<u32, ProtocolError> {
    reader.read_u32::<LittleEndian>().map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::Eof
        } else {
            ProtocolError::Io(err)
        }
    })
}

fn read_exact_or_truncated(
    reader: &mut impl Read,
    buf: &mut [u8],
    declared: usize,
) -> Result<(), ProtocolError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(ProtocolError::Truncated {
                    declared,
                    actual: filled,
                });
            },
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(ProtocolError::Io(err)),
        }
    }
    Ok(())
}
