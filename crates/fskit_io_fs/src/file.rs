//! File helpers.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use filetime::FileTime;
use tracing::debug;

use crate::copy::copy_file;
use crate::spec::{EnumPathKind, FsError, SpecFsPerms};
use crate::util::{classify_path, create_or_truncate_for_write, make_directory_all};

/// `path` exists and is not a directory.
pub fn file_exists<P: AsRef<Path>>(path: P) -> Result<bool, FsError> {
    let info = classify_path(path)?;
    Ok(info.if_exists() && !info.is_dir())
}

/// Create `path` empty, truncating any existing content.
///
/// `perms.perms_file` applies only when the file is newly created.
pub fn create_file<P: AsRef<Path>>(path: P, perms: SpecFsPerms) -> Result<(), FsError> {
    let path = path.as_ref();
    create_or_truncate_for_write(path, perms.perms_file)
        .map(|_| ())
        .map_err(|e| FsError::io(path, e))
}

/// Bump access and modification times to now, or create an empty file.
///
/// Missing parents are created with `perms.perms_dir`; a new file gets
/// exactly `perms.perms_file`.
pub fn touch<P: AsRef<Path>>(path: P, perms: SpecFsPerms) -> Result<(), FsError> {
    let path = path.as_ref();
    if classify_path(path)?.if_exists() {
        let time_now = FileTime::now();
        return filetime::set_file_times(path, time_now, time_now)
            .map_err(|e| FsError::io(path, e));
    }

    if let Some(path_parent) = path.parent()
        && !path_parent.as_os_str().is_empty()
    {
        make_directory_all(path_parent, perms.perms_dir)?;
    }
    create_or_truncate_for_write(path, perms.perms_file).map_err(|e| FsError::io(path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(perms.perms_file))
            .map_err(|e| FsError::io(path, e))?;
    }
    debug!(path = %path.display(), "touched new file");
    Ok(())
}

/// Append `data`, creating the file when missing.
pub fn append_to_file<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<(), FsError> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| FsError::io(path, e))?;
    file.write_all(data).map_err(|e| FsError::io(path, e))
}

/// Size in bytes of a non-directory path.
pub fn file_size<P: AsRef<Path>>(path: P) -> Result<u64, FsError> {
    let path = path.as_ref();
    match classify_path(path)?.kind() {
        None => Err(FsError::NotFound {
            path: path.to_path_buf(),
        }),
        Some(EnumPathKind::Directory) => Err(FsError::NotRegularFile {
            path: path.to_path_buf(),
            kind: EnumPathKind::Directory,
        }),
        Some(_) => fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| FsError::io(path, e)),
    }
}

/// Rename `file_source` to `file_destination`.
///
/// Across devices the file is copied through [`copy_file`] and the source
/// removed afterwards.
pub fn move_file<P, Q>(file_source: P, file_destination: Q) -> Result<(), FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_src = file_source.as_ref();
    let path_dst = file_destination.as_ref();
    match fs::rename(path_src, path_dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if classify_path(path_src)?.if_exists() {
                return Err(FsError::io(path_dst, e));
            }
            Err(FsError::NotFound {
                path: path_src.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                src = %path_src.display(),
                dst = %path_dst.display(),
                "rename crosses devices, copying instead"
            );
            copy_file(path_src, path_dst)?;
            fs::remove_file(path_src).map_err(|e| FsError::io(path_src, e))
        }
        Err(e) => Err(FsError::io(path_src, e)),
    }
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, FsError> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FsError::NotFound {
            path: path.to_path_buf(),
        },
        _ => FsError::io(path, e),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{Duration, SystemTime};

    use filetime::{FileTime, set_file_mtime};
    use tempfile::TempDir;

    use super::{append_to_file, create_file, file_exists, file_size, move_file, read_file, touch};
    use crate::spec::{FsError, SpecFsPerms};

    #[test]
    fn file_exists_false_for_missing_and_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("f.txt");

        assert!(!file_exists(&path_file).expect("missing"));
        assert!(!file_exists(tmp.path()).expect("dir"));
        fs::write(&path_file, "").expect("write");
        assert!(file_exists(&path_file).expect("file"));
    }

    #[test]
    fn create_file_truncates_existing_content() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("trunc.txt");
        fs::write(&path_file, "This is some initial content.").expect("write");

        create_file(&path_file, SpecFsPerms::default()).expect("create file");
        assert_eq!(fs::read(&path_file).expect("read").len(), 0);
    }

    #[test]
    fn touch_creates_file_and_parents() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("nested/dir/new.txt");

        touch(&path_file, SpecFsPerms::default()).expect("touch");
        assert!(path_file.is_file());
        assert_eq!(fs::read(&path_file).expect("read").len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn touch_new_file_gets_exact_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("script.sh");
        let perms = SpecFsPerms {
            perms_file: 0o600,
            ..SpecFsPerms::default()
        };

        touch(&path_file, perms).expect("touch");
        let mode = fs::metadata(&path_file).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn touch_existing_file_updates_mtime_and_keeps_content() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("old.txt");
        fs::write(&path_file, "keep").expect("write");
        let time_old = SystemTime::now() - Duration::from_secs(3600);
        set_file_mtime(&path_file, FileTime::from_system_time(time_old)).expect("set mtime");

        touch(&path_file, SpecFsPerms::default()).expect("touch");

        let time_new = fs::metadata(&path_file)
            .expect("meta")
            .modified()
            .expect("mtime");
        assert!(time_new > time_old + Duration::from_secs(1800));
        assert_eq!(fs::read_to_string(&path_file).expect("read"), "keep");
    }

    #[test]
    fn append_adds_after_existing_content() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("append.txt");
        fs::write(&path_file, "Initial content.\n").expect("write");

        append_to_file(&path_file, b"Appended content.\n").expect("append");
        assert_eq!(
            fs::read_to_string(&path_file).expect("read"),
            "Initial content.\nAppended content.\n"
        );
    }

    #[test]
    fn file_size_reports_byte_length() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("size.txt");
        fs::write(&path_file, "This is test content.\n").expect("write");

        assert_eq!(file_size(&path_file).expect("size"), 22);
        let err = file_size(tmp.path().join("missing")).expect_err("must fail");
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn move_file_relocates_content() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("move_src.txt");
        let path_dst = tmp.path().join("move_dst.txt");
        fs::write(&path_src, "moving").expect("write");

        move_file(&path_src, &path_dst).expect("move");
        assert!(!path_src.exists());
        assert_eq!(fs::read_to_string(&path_dst).expect("read"), "moving");
    }

    #[test]
    fn move_missing_source_is_not_found() {
        let tmp = TempDir::new().expect("tempdir");
        let err =
            move_file(tmp.path().join("nope"), tmp.path().join("dst")).expect_err("must fail");
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn read_file_returns_bytes() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("read.txt");
        fs::write(&path_file, "This is test content.\n").expect("write");

        assert_eq!(read_file(&path_file).expect("read"), b"This is test content.\n");
        let err = read_file(tmp.path().join("missing")).expect_err("must fail");
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
