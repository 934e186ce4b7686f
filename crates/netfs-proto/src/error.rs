//! Error types for the wire codec and request client.

use std::io;

use thiserror::Error;

/// Failures that can occur while framing or parsing a message on the IPC
/// channel.
///
/// A `ProtocolError` always poisons the [`crate::client::RequestClient`] that
/// produced it: there is no way to resynchronise with a peer once a frame
/// boundary has been lost.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The stream ended before a full length prefix could be read.
    #[error("stream closed while reading a frame length")]
    Eof,

    /// The stream ended after the length prefix but before `declared`
    /// payload bytes were available.
    #[error("frame truncated: declared {declared} bytes, got {actual}")]
    Truncated {
        /// Bytes the length prefix promised.
        declared: usize,
        /// Bytes actually read before the stream ended.
        actual: usize,
    },

    /// A declared frame length exceeded [`crate::codec::MAX_FRAME_LEN`].
    #[error("declared frame length {declared} exceeds sanity cap {max}")]
    TooLarge {
        /// The length the peer declared.
        declared: usize,
        /// The implementation's cap.
        max: usize,
    },

    /// `type` or `path` failed the encoder's ASCII/UTF-8/non-empty checks.
    #[error("invalid request field {field}: {reason}")]
    InvalidField {
        /// Which field failed validation.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// Underlying I/O failure on the channel (broken pipe, etc).
    #[error("I/O error on IPC channel: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced to a VFS handler after a client call.
///
/// This is distinct from [`ProtocolError`]: a `HandlerError` additionally
/// covers the "client is already poisoned" case, which isn't itself a
/// framing failure but has the same terminal effect.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The request client had already been poisoned by a prior
    /// [`ProtocolError`] and refused to send this call.
    #[error("request client is poisoned, refusing further calls")]
    Poisoned,

    /// The call itself failed at the protocol layer.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
