//! `fskit_io_fs` v1:
//! Rust-side filesystem helpers built around a tree copier.
//!
//! Modules:
//! - `copy`   : file copy (hard link, then byte stream) and tree sync
//! - `spec`   : enums/path models/permission defaults/errors
//! - `report` : sync run counters
//! - `util`   : path classifier and primitive filesystem capabilities
//! - `dir`    : directory helpers
//! - `file`   : file helpers
//! - `editor` : editor invocation

pub mod copy;
pub mod dir;
pub mod editor;
pub mod file;
pub mod report;
pub mod spec;
pub mod util;

pub use copy::{copy_file, copy_to, sync_tree};
pub use report::{ReportSync, ReportSyncBuilder};
pub use spec::{
    EnumCopyOutcome, EnumPathKind, FsError, SpecDirEntry, SpecFileIdentity, SpecFsPerms,
    SpecPathInfo, SpecPathMeta,
};
pub use util::{classify_path, classify_path_follow, same_file_identity};
