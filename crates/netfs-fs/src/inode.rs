//! Kernel inode number <-> path bookkeeping.
//!
//! `fuser`'s low-level `Filesystem` trait addresses everything by inode,
//! while the backend protocol (and the original libfuse-based driver this
//! crate replaces) addresses everything by path. libfuse's high-level
//! `fuse_operations` API performs exactly this translation internally; since
//! `netfs-fs` talks to the low-level kernel protocol directly, it has to do
//! the same translation itself.
//!
//! This table holds no backend-authoritative data -- no cached
//! [`crate::entity::EntityType`], no cached size. It only remembers which
//! inode number the kernel was told to use for which path, so that a later
//! upcall referencing that inode can be turned back into a path before
//! talking to the backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The inode FUSE reserves for the mount root.
pub const ROOT_INO: u64 = 1;

/// Bidirectional map between kernel inode numbers and absolute paths.
pub struct InodeTable {
    by_ino: HashMap<u64, PathBuf>,
    by_path: HashMap<PathBuf, u64>,
    next_ino: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        let mut by_ino = HashMap::new();
        let mut by_path = HashMap::new();
        by_ino.insert(ROOT_INO, PathBuf::from("/"));
        by_path.insert(PathBuf::from("/"), ROOT_INO);
        Self {
            by_ino,
            by_path,
            next_ino: ROOT_INO + 1,
        }
    }
}

impl InodeTable {
    /// Look up the path previously interned for `ino`, if any.
    pub fn path_of(&self, ino: u64) -> Option<&Path> {
        self.by_ino.get(&ino).map(PathBuf::as_path)
    }

    /// Return the inode for `path`, assigning a fresh one if this is the
    /// first time the path has been seen.
    pub fn intern(&mut self, path: &Path) -> u64 {
        if let Some(&ino) = self.by_path.get(path) {
            return ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.by_ino.insert(ino, path.to_path_buf());
        self.by_path.insert(path.to_path_buf(), ino);
        ino
    }

    /// Build the child path for a `parent`/`name` pair as the kernel
    /// presents them to `lookup`, `mkdir`, `unlink`, etc.
    pub fn child_path(&self, parent: u64, name: &std::ffi::OsStr) -> Option<PathBuf> {
        let parent_path = self.path_of(parent)?;
        Some(join_posix(parent_path, name))
    }

    /// The inode of `ino`'s parent directory, interning it if this is the
    /// first time it's been referenced. The root is its own parent.
    pub fn parent_ino(&mut self, ino: u64) -> Option<u64> {
        let path = self.path_of(ino)?.to_path_buf();
        if path == Path::new("/") {
            return Some(ROOT_INO);
        }
        let parent = path.parent().unwrap_or(Path::new("/")).to_path_buf();
        Some(self.intern(&parent))
    }
}

/// Join a parent path and a single path component the way POSIX paths
/// join, collapsing the double slash that a naive `Path::join` on the root
/// would otherwise leave behind.
fn join_posix(parent: &Path, name: &std::ffi::OsStr) -> PathBuf {
    if parent == Path::new("/") {
        let mut joined = PathBuf::from("/");
        joined.push(name);
        joined
    } else {
        parent.join(name)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn root_is_preseeded() {
        let table = InodeTable::default();
        assert_eq!(table.path_of(ROOT_INO), Some(Path::new("/")));
    }

    #[test]
    fn interning_the_same_path_twice_returns_the_same_inode() {
        let mut table = InodeTable::default();
        let a = table.intern(Path::new("/a"));
        let b = table.intern(Path::new("/a"));
        assert_eq!(a, b);
        assert_ne!(a, ROOT_INO);
    }

    #[test]
    fn distinct_paths_get_distinct_inodes() {
        let mut table = InodeTable::default();
        let a = table.intern(Path::new("/a"));
        let b = table.intern(Path::new("/b"));
        assert_ne!(a, b);
    }

    #[test]
    fn child_path_under_root_has_single_leading_slash() {
        let table = InodeTable::default();
        let child = table.child_path(ROOT_INO, std::ffi::OsStr::new("a")).unwrap();
        assert_eq!(child, Path::new("/a"));
    }

    #[test]
    fn unknown_inode_yields_no_path() {
        let table = InodeTable::default();
        assert!(table.path_of(9999).is_none());
        assert!(table.child_path(9999, std::ffi::OsStr::new("x")).is_none());
    }

    #[test]
    fn root_is_its_own_parent() {
        let mut table = InodeTable::default();
        assert_eq!(table.parent_ino(ROOT_INO), Some(ROOT_INO));
    }

    #[test]
    fn parent_ino_resolves_to_the_containing_directory() {
        let mut table = InodeTable::default();
        let dir = table.intern(Path::new("/a"));
        let child = table.intern(Path::new("/a/b"));
        assert_eq!(table.parent_ino(child), Some(dir));
        assert_eq!(table.parent_ino(dir), Some(ROOT_INO));
    }
}
