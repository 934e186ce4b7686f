//! One function per kernel VFS upcall.
//!
//! Each function here maps its arguments to one or more backend verbs
//! (§4.3 of the driver's protocol contract) and maps the backend's reply to
//! a [`PosixError`] or a success value. None of these functions touch
//! `fuser` types directly -- [`crate::filesystem::NetfsFilesystem`] is the
//! only place that translates to and from the kernel's inode-addressed
//! calling convention.

use std::io::{Read, Write};

use netfs_proto::RequestClient;

use crate::entity::EntityType;
use crate::error::PosixError;

/// Attributes needed to populate a `getattr` reply, once the entity is
/// known not to be absent.
pub struct Metadata {
    /// What kind of entity this is.
    pub kind: EntityType,
    /// `rwxr-xr-x` vs. `r-xr-xr-x`, meaningful only for regular files.
    pub writable: bool,
    /// Byte size, meaningful only for regular files.
    pub size: u64,
}

fn is_true(reply: &str) -> bool {
    reply.trim() == "1"
}

/// `exists` verb.
pub fn exists<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<bool, PosixError> {
    let reply = client.call("exists", path)?;
    Ok(is_true(&reply))
}

/// `file_writable` verb.
pub fn file_writable<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<bool, PosixError> {
    let reply = client.call("file_writable", path)?;
    Ok(is_true(&reply))
}

/// `entity_type` verb.
pub fn entity_type<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<EntityType, PosixError> {
    let reply = client.call("entity_type", path)?;
    EntityType::parse(&reply)
}

/// `file_size` verb.
pub fn file_size<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<u64, PosixError> {
    let reply = client.call("file_size", path)?;
    reply.trim().parse::<u64>().map_err(|_| PosixError::IoError)
}

/// **getattr**: query `entity_type`, then whatever else the kind requires.
pub fn getattr<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<Metadata, PosixError> {
    match entity_type(client, path)? {
        EntityType::Absent => Err(PosixError::NotFound),
        EntityType::RegularFile => {
            let writable = file_writable(client, path)?;
            let size = file_size(client, path)?;
            Ok(Metadata {
                kind: EntityType::RegularFile,
                writable,
                size,
            })
        },
        EntityType::Socket => Ok(Metadata {
            kind: EntityType::Socket,
            writable: false,
            size: 0,
        }),
        EntityType::Directory => Ok(Metadata {
            kind: EntityType::Directory,
            writable: false,
            size: 0,
        }),
    }
}

/// **readdir**: `.` and `..` first, then the backend's names verbatim.
pub fn readdir<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<Vec<String>, PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }

    let reply = client.call("read_dir", path)?;
    let mut names = vec![".".to_owned(), "..".to_owned()];
    if !reply.is_empty() {
        names.extend(reply.split('\n').map(str::to_owned));
    }
    Ok(names)
}

/// **open**: existence, then a writability check only if a write-capable
/// mode was requested.
pub fn open<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
    wants_write: bool,
) -> Result<(), PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }
    if wants_write && !file_writable(client, path)? {
        return Err(PosixError::PermissionDenied);
    }
    Ok(())
}

/// **read**: `read_file(offset, size)`; short replies are returned as-is.
pub fn read<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
    offset: i64,
    size: u32,
) -> Result<Vec<u8>, PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }

    let mut buf = vec![0u8; size as usize];
    let n = client.call_for_binary("read_file", path, offset as i32, size as i32, "", &mut buf);
    if n < 0 {
        return Err(PosixError::IoError);
    }
    buf.truncate(n as usize);
    Ok(buf)
}

/// **write**: `write_file(offset, payload)`; partial writes are not
/// modelled -- success means the full requested size was accepted.
pub fn write<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
    offset: i64,
    data: &[u8],
) -> Result<u32, PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }

    let reply = client.call_binary("write_file", path, offset as i32, 0, data)?;
    if is_true(&reply) {
        Ok(data.len() as u32)
    } else {
        Err(PosixError::IoError)
    }
}

/// **create**: no existence precheck -- the backend is the arbiter of
/// whether creation succeeds.
pub fn create<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<(), PosixError> {
    let reply = client.call("create_file", path)?;
    if is_true(&reply) {
        Ok(())
    } else {
        Err(PosixError::IoError)
    }
}

/// **mkdir**: no existence precheck, parallel to `create`.
pub fn mkdir<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<(), PosixError> {
    let reply = client.call("mkdir", path)?;
    if is_true(&reply) {
        Ok(())
    } else {
        Err(PosixError::IoError)
    }
}

/// **unlink**: existence precheck, then the verb.
pub fn unlink<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<(), PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }
    let reply = client.call("unlink", path)?;
    if is_true(&reply) {
        Ok(())
    } else {
        Err(PosixError::IoError)
    }
}

/// **rmdir**: existence precheck, then the verb.
pub fn rmdir<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<(), PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }
    let reply = client.call("rmdir", path)?;
    if is_true(&reply) {
        Ok(())
    } else {
        Err(PosixError::IoError)
    }
}

/// **truncate**: existence, then writability, then the verb.
pub fn truncate<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
    size: i64,
) -> Result<(), PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }
    if !file_writable(client, path)? {
        return Err(PosixError::PermissionDenied);
    }
    let reply = client.call_string("truncate", path, size as i32, 0, "")?;
    if is_true(&reply) {
        Ok(())
    } else {
        Err(PosixError::IoError)
    }
}

/// **rename**: source existence, then the no-replace/exchange flag
/// semantics described in §4.3, then the appropriate verb.
pub fn rename<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    from: &str,
    to: &str,
    no_replace: bool,
    exchange: bool,
) -> Result<(), PosixError> {
    if !exists(client, from)? {
        return Err(PosixError::NotFound);
    }

    if no_replace && exists(client, to)? {
        return Err(PosixError::AlreadyExists);
    }

    if exchange {
        if !exists(client, to)? {
            return Err(PosixError::NotFound);
        }
        let reply = client.call_string("rename_exchange", from, 0, 0, to)?;
        return if is_true(&reply) {
            Ok(())
        } else {
            Err(PosixError::IoError)
        };
    }

    let reply = client.call_string("rename", from, 0, 0, to)?;
    if is_true(&reply) {
        Ok(())
    } else {
        Err(PosixError::IoError)
    }
}

/// **chmod**: existence check only. Permissions are not honoured by
/// design -- preserved from the original driver, whose real chmod logic
/// is commented out rather than removed. This is intentional, not an
/// unfinished handler.
pub fn chmod<R: Read, W: Write>(
    client: &mut RequestClient<R, W>,
    path: &str,
) -> Result<(), PosixError> {
    if !exists(client, path)? {
        return Err(PosixError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
