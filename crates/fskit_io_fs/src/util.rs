use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::spec::{
    EnumPathKind, FsError, SpecDirEntry, SpecFileIdentity, SpecPathInfo, SpecPathMeta,
};

////////////////////////////////////////////////////////////////////////////////
// #region PathClassifier

/// Probe `path` once without following symlinks.
///
/// A missing path is reported as `meta: None`, not as an error. Any other
/// probe failure is [`FsError::Access`].
pub fn classify_path<P: AsRef<Path>>(path: P) -> Result<SpecPathInfo, FsError> {
    let path = path.as_ref();
    _build_path_info(path, fs::symlink_metadata(path))
}

/// Like [`classify_path`], but a symlink is resolved to what it points at.
///
/// Used for the roots handed to the tree copier, so `/tmp -> /private/tmp`
/// style links are accepted there while links inside the tree are not.
pub fn classify_path_follow<P: AsRef<Path>>(path: P) -> Result<SpecPathInfo, FsError> {
    let path = path.as_ref();
    _build_path_info(path, fs::metadata(path))
}

fn _build_path_info(
    path: &Path,
    meta_res: io::Result<fs::Metadata>,
) -> Result<SpecPathInfo, FsError> {
    match meta_res {
        Ok(meta) => Ok(SpecPathInfo {
            path: path.to_path_buf(),
            meta: Some(_derive_path_meta(&meta)),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SpecPathInfo {
            path: path.to_path_buf(),
            meta: None,
        }),
        Err(e) => Err(FsError::Access {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

pub(crate) fn derive_path_kind(file_type: fs::FileType) -> EnumPathKind {
    if file_type.is_dir() {
        EnumPathKind::Directory
    } else if file_type.is_file() {
        EnumPathKind::RegularFile
    } else {
        EnumPathKind::Other
    }
}

fn _derive_path_meta(meta: &fs::Metadata) -> SpecPathMeta {
    SpecPathMeta {
        kind: derive_path_kind(meta.file_type()),
        mode: _derive_mode(meta),
        identity: _derive_identity(meta),
    }
}

#[cfg(unix)]
fn _derive_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn _derive_mode(_meta: &fs::Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn _derive_identity(meta: &fs::Metadata) -> Option<SpecFileIdentity> {
    use std::os::unix::fs::MetadataExt;
    Some(SpecFileIdentity {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn _derive_identity(_meta: &fs::Metadata) -> Option<SpecFileIdentity> {
    None
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Capabilities

pub fn path_exists<P: AsRef<Path>>(path: P) -> Result<bool, FsError> {
    Ok(classify_path(path)?.if_exists())
}

pub fn is_directory<P: AsRef<Path>>(path: P) -> Result<bool, FsError> {
    Ok(classify_path(path)?.is_dir())
}

/// Both snapshots exist and refer to the same underlying file.
///
/// Compares device+inode where the platform exposes them, canonical paths
/// otherwise.
pub fn same_file_identity(info_a: &SpecPathInfo, info_b: &SpecPathInfo) -> bool {
    let (Some(meta_a), Some(meta_b)) = (info_a.meta, info_b.meta) else {
        return false;
    };
    match (meta_a.identity, meta_b.identity) {
        (Some(a), Some(b)) => a == b,
        _ => match (fs::canonicalize(&info_a.path), fs::canonicalize(&info_b.path)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}

/// `mkdir -p` with `mode` applied to every directory it creates.
///
/// Already existing components are left untouched. The effective mode is
/// still subject to the process umask.
pub fn make_directory_all(path: &Path, mode: u32) -> Result<(), FsError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }
    builder.create(path).map_err(|e| FsError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn open_for_read(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Create or truncate `path` for writing. `mode` only applies on creation.
pub fn create_or_truncate_for_write(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }
    options.open(path)
}

pub fn hard_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    fs::hard_link(path_src, path_dst)
}

/// Immediate children of `path`, sorted by file name.
pub fn list_directory_entries(path: &Path) -> Result<Vec<SpecDirEntry>, FsError> {
    let map_read_err = |e: io::Error| FsError::ReadDir {
        path: path.to_path_buf(),
        source: e,
    };

    let mut l_entries = Vec::new();
    for entry_res in fs::read_dir(path).map_err(map_read_err)? {
        let entry = entry_res.map_err(map_read_err)?;
        let path_entry = entry.path();
        let cfg_file_type = entry.file_type().map_err(|e| FsError::Access {
            path: path_entry.clone(),
            source: e,
        })?;
        l_entries.push(SpecDirEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            path: path_entry,
            kind: derive_path_kind(cfg_file_type),
        });
    }
    l_entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(l_entries)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the longest existing ancestor and re-append the rest.
fn _normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_cursor = path_abs.as_path();
    let mut l_tail = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_cursor) {
            let mut path_out = resolved;
            for part in l_tail.iter().rev() {
                path_out.push(part);
            }
            return path_out;
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_cursor = parent;
            }
            _ => return path_abs,
        }
    }
}

/// `dst` resolves to a strict descendant of `src`.
pub(crate) fn is_nested_inside(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved != src_resolved && dst_resolved.starts_with(&src_resolved)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{
        classify_path, classify_path_follow, is_directory, is_nested_inside,
        list_directory_entries, make_directory_all, path_exists, same_file_identity,
    };
    use crate::spec::{EnumPathKind, FsError};

    #[test]
    fn classify_missing_path_is_not_an_error() {
        let tmp = TempDir::new().expect("tempdir");
        let info = classify_path(tmp.path().join("missing")).expect("classify");
        assert!(!info.if_exists());
        assert_eq!(info.kind(), None);
        assert!(!path_exists(tmp.path().join("missing")).expect("exists"));
    }

    #[test]
    fn classify_reports_directory_and_regular_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("a.txt");
        fs::write(&path_file, "a").expect("write");

        let info_dir = classify_path(tmp.path()).expect("classify dir");
        assert_eq!(info_dir.kind(), Some(EnumPathKind::Directory));
        assert!(is_directory(tmp.path()).expect("is dir"));

        let info_file = classify_path(&path_file).expect("classify file");
        assert!(info_file.is_regular_file());
        assert!(!is_directory(&path_file).expect("is dir"));
    }

    #[cfg(unix)]
    #[test]
    fn classify_symlink_and_socket_as_other() {
        use std::os::unix::fs::symlink;
        use std::os::unix::net::UnixListener;

        let tmp = TempDir::new().expect("tempdir");
        fs::write(tmp.path().join("target.txt"), "t").expect("write");
        symlink(tmp.path().join("target.txt"), tmp.path().join("link")).expect("symlink");
        let _listener = UnixListener::bind(tmp.path().join("sock")).expect("bind socket");

        let info_link = classify_path(tmp.path().join("link")).expect("classify link");
        assert_eq!(info_link.kind(), Some(EnumPathKind::Other));
        let info_sock = classify_path(tmp.path().join("sock")).expect("classify sock");
        assert_eq!(info_sock.kind(), Some(EnumPathKind::Other));
    }

    #[cfg(unix)]
    #[test]
    fn classify_follow_resolves_symlinked_directory() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let path_real = tmp.path().join("real");
        let path_link = tmp.path().join("link");
        fs::create_dir(&path_real).expect("mkdir");
        symlink(&path_real, &path_link).expect("symlink");

        assert_eq!(
            classify_path(&path_link).expect("no follow").kind(),
            Some(EnumPathKind::Other)
        );
        let info_follow = classify_path_follow(&path_link).expect("follow");
        assert!(info_follow.is_dir());
        assert_eq!(info_follow.path, path_link);

        symlink(tmp.path().join("gone"), tmp.path().join("dangling")).expect("symlink");
        let info_dangling = classify_path_follow(tmp.path().join("dangling")).expect("dangling");
        assert!(!info_dangling.if_exists());
    }

    #[cfg(unix)]
    #[test]
    fn classify_through_regular_file_is_access_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("a.txt");
        fs::write(&path_file, "a").expect("write");
        let path_bad = path_file.join("x");

        let err = classify_path(&path_bad).expect_err("ENOTDIR must surface");
        assert!(matches!(err, FsError::Access { ref path, .. } if *path == path_bad));
        assert_eq!(err.path(), path_bad.as_path());
        assert!(path_exists(&path_bad).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn classify_captures_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("mode.txt");
        fs::write(&path_file, "m").expect("write");
        fs::set_permissions(&path_file, fs::Permissions::from_mode(0o640)).expect("chmod");

        let info = classify_path(&path_file).expect("classify");
        assert_eq!(info.mode(), Some(0o640));
    }

    #[cfg(unix)]
    #[test]
    fn same_identity_detects_hard_links_only() {
        let tmp = TempDir::new().expect("tempdir");
        let path_a = tmp.path().join("a.txt");
        let path_b = tmp.path().join("b.txt");
        let path_c = tmp.path().join("c.txt");
        fs::write(&path_a, "same").expect("write a");
        fs::hard_link(&path_a, &path_b).expect("link");
        fs::write(&path_c, "same").expect("write c");

        let info_a = classify_path(&path_a).expect("a");
        let info_b = classify_path(&path_b).expect("b");
        let info_c = classify_path(&path_c).expect("c");
        let info_missing = classify_path(tmp.path().join("missing")).expect("missing");
        assert!(same_file_identity(&info_a, &info_b));
        assert!(!same_file_identity(&info_a, &info_c));
        assert!(!same_file_identity(&info_a, &info_missing));
    }

    #[test]
    fn list_entries_sorted_by_name() {
        let tmp = TempDir::new().expect("tempdir");
        fs::write(tmp.path().join("b.txt"), "b").expect("write");
        fs::write(tmp.path().join("a.txt"), "a").expect("write");
        fs::create_dir(tmp.path().join("c")).expect("mkdir");

        let l_entries = list_directory_entries(tmp.path()).expect("list");
        let l_names: Vec<_> = l_entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(l_names, vec!["a.txt", "b.txt", "c"]);
        assert_eq!(l_entries[2].kind, EnumPathKind::Directory);
        assert_eq!(l_entries[0].kind, EnumPathKind::RegularFile);
    }

    #[test]
    fn make_directory_all_is_noop_when_present() {
        let tmp = TempDir::new().expect("tempdir");
        let path_dir = tmp.path().join("x/y/z");
        make_directory_all(&path_dir, 0o755).expect("first");
        make_directory_all(&path_dir, 0o755).expect("second");
        assert!(path_dir.is_dir());
    }

    #[test]
    fn make_directory_all_under_regular_file_is_create_dir_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("blocker");
        fs::write(&path_file, "b").expect("write");
        let path_dir = path_file.join("sub");

        let err = make_directory_all(&path_dir, 0o755).expect_err("must fail");
        assert!(matches!(err, FsError::CreateDir { ref path, .. } if *path == path_dir));
    }

    #[test]
    fn list_entries_of_regular_file_is_read_dir_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("plain.txt");
        fs::write(&path_file, "p").expect("write");

        let err = list_directory_entries(&path_file).expect_err("must fail");
        assert!(matches!(err, FsError::ReadDir { ref path, .. } if *path == path_file));
    }

    #[test]
    fn nested_destination_detected_before_it_exists() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        fs::create_dir(&src).expect("mkdir");

        assert!(is_nested_inside(&src, &src.join("out/deeper")));
        assert!(!is_nested_inside(&src, &src));
        assert!(!is_nested_inside(&src, &tmp.path().join("src_sibling")));
        assert!(!is_nested_inside(&src.join("inner"), &src));
    }
}
