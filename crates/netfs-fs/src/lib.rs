//! VFS operation handlers and the `fuser::Filesystem` binding that exposes
//! the netfs backend as a mounted filesystem.

mod entity;
mod error;
mod filesystem;
mod inode;
pub mod ops;

#[cfg(test)]
mod test_support;

pub use entity::EntityType;
pub use error::PosixError;
pub use filesystem::NetfsFilesystem;
pub use inode::{InodeTable, ROOT_INO};
