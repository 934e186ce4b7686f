//! Wire framing and a synchronous request/response client for the netfs
//! backend IPC protocol.
//!
//! This crate knows nothing about POSIX, FUSE, or filesystem semantics --
//! see `netfs-fs` for that. It only knows how to turn `(verb, path, x, y,
//! data)` tuples into length-prefixed frames and back.

mod client;
mod codec;
mod error;

pub use client::RequestClient;
pub use codec::{decode_response, encode_request, MAX_FRAME_LEN};
pub use error::{HandlerError, ProtocolError};
