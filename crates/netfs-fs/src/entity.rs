//! The backend's four-valued classification of a path.

use crate::error::PosixError;

/// The backend's ground truth for path existence and classification.
///
/// The driver never caches this -- every handler that needs it issues a
/// fresh `entity_type` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    /// Nothing exists at this path.
    Absent,
    /// A regular file.
    RegularFile,
    /// A Unix domain socket.
    Socket,
    /// A directory.
    Directory,
}

impl EntityType {
    /// Parse the decimal ASCII reply of the `entity_type` verb.
    ///
    /// Any reply outside `0..=3` is not a valid classification and is
    /// treated as a protocol-level failure (`IoError`), matching the spec's
    /// "any other reply is an `IO_ERROR`" contract for `getattr`.
    pub fn parse(reply: &str) -> Result<Self, PosixError> {
        match reply.trim() {
            "0" => Ok(Self::Absent),
            "1" => Ok(Self::RegularFile),
            "2" => Ok(Self::Socket),
            "3" => Ok(Self::Directory),
            _ => Err(PosixError::IoError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_known_discriminant() {
        assert_eq!(EntityType::parse("0").unwrap(), EntityType::Absent);
        assert_eq!(EntityType::parse("1").unwrap(), EntityType::RegularFile);
        assert_eq!(EntityType::parse("2").unwrap(), EntityType::Socket);
        assert_eq!(EntityType::parse("3").unwrap(), EntityType::Directory);
    }

    #[test]
    fn rejects_unknown_discriminants() {
        assert!(matches!(EntityType::parse("4"), Err(PosixError::IoError)));
        assert!(matches!(EntityType::parse("nope"), Err(PosixError::IoError)));
        assert!(matches!(EntityType::parse(""), Err(PosixError::IoError)));
    }
}
