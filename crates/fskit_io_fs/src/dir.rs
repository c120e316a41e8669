//! Directory helpers.

use std::fs;
use std::path::Path;

use crate::spec::{EnumPathKind, FsError, SpecDirEntry, SpecFsPerms};
use crate::util::{classify_path, list_directory_entries, make_directory_all};

/// Create `path` and any missing ancestors with `perms.perms_dir`.
pub fn create_dir<P: AsRef<Path>>(path: P, perms: SpecFsPerms) -> Result<(), FsError> {
    make_directory_all(path.as_ref(), perms.perms_dir)
}

/// Make sure `path` is a directory, creating it when missing.
pub fn ensure_dir<P: AsRef<Path>>(path: P, perms: SpecFsPerms) -> Result<(), FsError> {
    let path = path.as_ref();
    match classify_path(path)?.kind() {
        None => make_directory_all(path, perms.perms_dir),
        Some(EnumPathKind::Directory) => Ok(()),
        Some(_) => Err(FsError::NotDirectory {
            path: path.to_path_buf(),
        }),
    }
}

/// `path` exists and is a directory.
pub fn dir_exists<P: AsRef<Path>>(path: P) -> Result<bool, FsError> {
    Ok(classify_path(path)?.is_dir())
}

/// All immediate children, sorted by name.
pub fn list_dir<P: AsRef<Path>>(path: P) -> Result<Vec<SpecDirEntry>, FsError> {
    let path = path.as_ref();
    _require_dir(path)?;
    list_directory_entries(path)
}

/// Names of the immediate child directories, sorted.
pub fn list_subdirs<P: AsRef<Path>>(path: P) -> Result<Vec<String>, FsError> {
    Ok(list_dir(path)?
        .into_iter()
        .filter(|e| e.kind == EnumPathKind::Directory)
        .map(|e| e.name)
        .collect())
}

pub fn is_empty_dir<P: AsRef<Path>>(path: P) -> Result<bool, FsError> {
    let path = path.as_ref();
    _require_dir(path)?;
    let mut iter_entries = fs::read_dir(path).map_err(|e| FsError::ReadDir {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(iter_entries.next().is_none())
}

fn _require_dir(path: &Path) -> Result<(), FsError> {
    match classify_path(path)?.kind() {
        None => Err(FsError::NotFound {
            path: path.to_path_buf(),
        }),
        Some(EnumPathKind::Directory) => Ok(()),
        Some(_) => Err(FsError::NotDirectory {
            path: path.to_path_buf(),
        }),
    }
}
