//! Synchronous send-one, await-one transport above the wire codec.

use std::io::{Read, Write};

use log::debug;

use crate::codec::{decode_response, encode_request};
use crate::error::{HandlerError, ProtocolError};

/// A request client that has become unusable after a framing failure.
///
/// Once poisoned, every subsequent call fails immediately with
/// [`HandlerError::Poisoned`] without touching the underlying stream again
/// -- there is no way to resynchronise with a peer once a frame boundary has
/// been lost.
#[derive(Debug, Default)]
struct PoisonFlag(bool);

/// Owns the outbound and inbound byte streams to the backend and serialises
/// every verb into exactly one write-then-read round trip.
///
/// `R` and `W` are generic so the same client drives a real child process's
/// stdio pair in production and a `UnixStream` half in tests.
///
/// Concurrent calls are undefined: the driver host is responsible for
/// guaranteeing that only one upcall at a time ever reaches a given
/// `RequestClient`.
pub struct RequestClient<R, W> {
    reader: R,
    writer: W,
    poisoned: PoisonFlag,
}

impl<R: Read, W: Write> RequestClient<R, W> {
    /// Build a client around an already-connected reader/writer pair.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            poisoned: PoisonFlag::default(),
        }
    }

    /// `true` once any call has poisoned this client.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.0
    }

    /// Shorthand for `call_string(verb, path, 0, 0, "")`.
    pub fn call(&mut self, verb: &str, path: &str) -> Result<String, HandlerError> {
        self.call_string(verb, path, 0, 0, "")
    }

    /// Send a verb whose data payload is UTF-8 text and whose reply is
    /// interpreted as a UTF-8 string.
    pub fn call_string(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        text: &str,
    ) -> Result<String, HandlerError> {
        let bytes = self.call_raw(verb, path, x, y, text.as_bytes())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a verb whose data payload is raw bytes (used for writes) and
    /// whose reply is interpreted as a UTF-8 string (e.g. `"1"`/`"0"`).
    pub fn call_binary(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        data: &[u8],
    ) -> Result<String, HandlerError> {
        let bytes = self.call_raw(verb, path, x, y, data)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a verb whose data payload is UTF-8 text and whose reply is raw
    /// bytes, copied into `out_buf` up to its capacity.
    ///
    /// Returns the number of bytes written into `out_buf`, or a negative
    /// value if the call failed. A reply larger than `out_buf` is drained
    /// from the channel (so framing is preserved for the next call) and
    /// reported as a failure.
    pub fn call_for_binary(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        text: &str,
        out_buf: &mut [u8],
    ) -> i64 {
        match self.call_for_binary_inner(verb, path, x, y, text, out_buf) {
            Ok(n) => n as i64,
            Err(_) => -1,
        }
    }

    fn call_for_binary_inner(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        text: &str,
        out_buf: &mut [u8],
    ) -> Result<usize, HandlerError> {
        self.ensure_not_poisoned()?;
        let response = self.round_trip(verb, path, x, y, text.as_bytes())?;

        if response.len() > out_buf.len() {
            // The channel is already framed correctly (we read the whole
            // reply above); the "too large" failure is ours to report, not
            // a protocol desync.
            return Err(HandlerError::Protocol(ProtocolError::TooLarge {
                declared: response.len(),
                max: out_buf.len(),
            }));
        }

        out_buf[..response.len()].copy_from_slice(&response);
        Ok(response.len())
    }

    fn call_raw(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        data: &[u8],
    ) -> Result<Vec<u8>, HandlerError> {
        self.ensure_not_poisoned()?;
        self.round_trip(verb, path, x, y, data).map_err(HandlerError::from)
    }

    fn round_trip(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        data: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        debug!("-> {verb} {path} x={x} y={y} data_len={}", data.len());
        let result = self.send_and_receive(verb, path, x, y, data);
        if result.is_err() {
            self.poisoned.0 = true;
        }
        result
    }

    fn send_and_receive(
        &mut self,
        verb: &str,
        path: &str,
        x: i32,
        y: i32,
        data: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        let frame = encode_request(verb, path, x, y, data)?;
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        decode_response(&mut self.reader)
    }

    fn ensure_not_poisoned(&self) -> Result<(), HandlerError> {
        if self.poisoned.0 {
            Err(HandlerError::Poisoned)
        } else {
            Ok(())
        }
    }
}
