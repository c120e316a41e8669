//! Path models, permission defaults and the crate error type.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Kind of a filesystem entry as reported by a non-following metadata probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPathKind {
    /// Directory.
    Directory,
    /// Ordinary byte-addressable file.
    RegularFile,
    /// Anything else: symlink, device, socket, fifo.
    Other,
}

impl fmt::Display for EnumPathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::Directory => "directory",
            Self::RegularFile => "regular file",
            Self::Other => "special file",
        };
        f.write_str(c_name)
    }
}

/// What a single-file copy actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyOutcome {
    /// Source and destination already share one identity; no I/O performed.
    Unchanged,
    /// Destination was created as a hard link to the source.
    ///
    /// Both paths now refer to the same storage: writing through one is
    /// visible through the other. The copier promises equal content, not
    /// independent storage.
    Linked,
    /// Bytes were streamed into the destination and synced to disk.
    Streamed,
}

impl EnumCopyOutcome {
    /// Lower-case outcome name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Linked => "linked",
            Self::Streamed => "streamed",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathModels

/// Storage identity of a file (`st_dev`, `st_ino`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecFileIdentity {
    /// Device id.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
}

/// Metadata captured for an existing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPathMeta {
    /// Entry kind.
    pub kind: EnumPathKind,
    /// Permission bits (`0o7777` mask). Zero where the platform has none.
    pub mode: u32,
    /// Device+inode pair. `None` where the platform does not expose one.
    pub identity: Option<SpecFileIdentity>,
}

/// One metadata snapshot of a path.
///
/// Taken once per probe and never cached: a second probe may see a
/// different state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPathInfo {
    /// Probed path.
    pub path: PathBuf,
    /// `None` when the path does not exist.
    pub meta: Option<SpecPathMeta>,
}

impl SpecPathInfo {
    pub fn if_exists(&self) -> bool {
        self.meta.is_some()
    }

    pub fn kind(&self) -> Option<EnumPathKind> {
        self.meta.map(|m| m.kind)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == Some(EnumPathKind::Directory)
    }

    pub fn is_regular_file(&self) -> bool {
        self.kind() == Some(EnumPathKind::RegularFile)
    }

    /// Permission bits, or `None` when the path does not exist.
    pub fn mode(&self) -> Option<u32> {
        self.meta.map(|m| m.mode)
    }
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDirEntry {
    /// File name (lossy UTF-8).
    pub name: String,
    /// Full path of the child.
    pub path: PathBuf,
    /// Kind as reported by the directory listing (symlinks are not followed).
    pub kind: EnumPathKind,
}

/// Permission bits used when something is created without a source to
/// inherit from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFsPerms {
    /// Mode for new directories.
    pub perms_dir: u32,
    /// Mode for new files.
    pub perms_file: u32,
}

impl Default for SpecFsPerms {
    fn default() -> Self {
        Self {
            perms_dir: 0o755,
            perms_file: 0o644,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised by classification, copy and helper operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// A required source path does not exist.
    #[error("Path does not exist: {}", .path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// Path exists but is not a directory.
    #[error("Not a directory: {}", .path.display())]
    NotDirectory {
        /// Offending path.
        path: PathBuf,
    },
    /// Path exists but is not a regular file.
    #[error("Not a regular file: {} ({kind})", .path.display())]
    NotRegularFile {
        /// Offending path.
        path: PathBuf,
        /// Kind actually found.
        kind: EnumPathKind,
    },
    /// Metadata probe failed for a reason other than non-existence.
    #[error("Failed to inspect {}: {source}", .path.display())]
    Access {
        /// Probed path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Byte-stream copy failed at open, read/write or sync.
    #[error(
        "Failed to copy {} -> {}: {source}{}",
        .src.display(),
        .dst.display(),
        _fmt_link_hint(.link_error)
    )]
    Copy {
        /// Source file.
        src: PathBuf,
        /// Destination file (may be left partially written).
        dst: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
        /// Text of the hard-link failure that preceded the stream copy.
        link_error: Option<String>,
    },
    /// Directory creation failed.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Directory enumeration failed.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Destination lies strictly inside the source tree.
    #[error(
        "Destination is nested inside source: {} <-> {}",
        .source_dir.display(),
        .destination.display()
    )]
    DestinationInsideSource {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Helper-level IO failure.
    #[error("IO failure on {}: {source}", .path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Editor could not be started or exited unsuccessfully.
    #[error("Editor `{editor}` failed on {}: {message}", .path.display())]
    Editor {
        /// Editor command line.
        editor: String,
        /// File handed to the editor.
        path: PathBuf,
        /// Spawn error or exit status text.
        message: String,
    },
}

impl FsError {
    /// Primary path the error refers to.
    ///
    /// For [`FsError::Copy`] this is the destination, for
    /// [`FsError::DestinationInsideSource`] the destination directory.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::NotDirectory { path }
            | Self::NotRegularFile { path, .. }
            | Self::Access { path, .. }
            | Self::CreateDir { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Io { path, .. }
            | Self::Editor { path, .. } => path,
            Self::Copy { dst, .. } => dst,
            Self::DestinationInsideSource { destination, .. } => destination,
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn _fmt_link_hint(link_error: &Option<String>) -> String {
    match link_error {
        Some(msg) => format!(" (hard link also failed: {msg})"),
        None => String::new(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
