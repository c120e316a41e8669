//! File and directory-tree copy orchestration.
//!
//! Everything here is synchronous and runs on the calling thread. There is
//! no locking: two calls whose source or destination trees overlap race on
//! the filesystem exactly as two shell `cp -r` invocations would.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::report::{ReportSync, ReportSyncBuilder};
use crate::spec::{EnumCopyOutcome, EnumPathKind, FsError, SpecPathInfo};
use crate::util::{
    classify_path, classify_path_follow, create_or_truncate_for_write, hard_link,
    is_nested_inside, list_directory_entries, make_directory_all, open_for_read,
    same_file_identity,
};

/// One way of materializing a destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumCopyAttempt {
    HardLink,
    StreamCopy,
}

const L_COPY_ATTEMPTS: [EnumCopyAttempt; 2] =
    [EnumCopyAttempt::HardLink, EnumCopyAttempt::StreamCopy];

////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy one regular file from `file_source` to `file_destination`.
///
/// Steps:
/// 1. `file_source` must be a regular file and `file_destination`, when it
///    exists, must be one too.
/// 2. If both already share a device+inode identity nothing is done.
/// 3. A hard link is attempted. When it works the destination shares
///    storage with the source, so later writes through either path show up
///    in both.
/// 4. If linking fails for any reason (existing destination, cross-device,
///    unsupported) the bytes are streamed into a created/truncated
///    destination which is then synced to disk.
///
/// A failed stream copy leaves whatever was written in place.
///
/// A streamed destination is created with the source's mode. For a
/// read-only source that makes the copy read-only too, so a later stream
/// over it (e.g. a cross-device re-sync) fails with permission denied for
/// callers that cannot bypass file modes.
pub fn copy_file<P, Q>(file_source: P, file_destination: Q) -> Result<EnumCopyOutcome, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    _copy_file_with(
        file_source.as_ref(),
        file_destination.as_ref(),
        &L_COPY_ATTEMPTS,
    )
}

fn _copy_file_with(
    path_file_src: &Path,
    path_file_dst: &Path,
    l_attempts: &[EnumCopyAttempt],
) -> Result<EnumCopyOutcome, FsError> {
    let info_src = classify_path(path_file_src)?;
    match info_src.kind() {
        None => {
            return Err(FsError::NotFound {
                path: path_file_src.to_path_buf(),
            });
        }
        Some(EnumPathKind::RegularFile) => {}
        Some(kind) => {
            return Err(FsError::NotRegularFile {
                path: path_file_src.to_path_buf(),
                kind,
            });
        }
    }

    let info_dst = classify_path(path_file_dst)?;
    if let Some(kind) = info_dst.kind() {
        if kind != EnumPathKind::RegularFile {
            return Err(FsError::NotRegularFile {
                path: path_file_dst.to_path_buf(),
                kind,
            });
        }
        if same_file_identity(&info_src, &info_dst) {
            debug!(
                src = %path_file_src.display(),
                dst = %path_file_dst.display(),
                "destination already shares source identity"
            );
            return Ok(EnumCopyOutcome::Unchanged);
        }
    }

    let mut err_link: Option<io::Error> = None;
    for enum_attempt in l_attempts {
        match enum_attempt {
            EnumCopyAttempt::HardLink => match hard_link(path_file_src, path_file_dst) {
                Ok(()) => {
                    debug!(
                        src = %path_file_src.display(),
                        dst = %path_file_dst.display(),
                        "hard linked"
                    );
                    return Ok(EnumCopyOutcome::Linked);
                }
                Err(e) => {
                    debug!(
                        src = %path_file_src.display(),
                        dst = %path_file_dst.display(),
                        reason = %e,
                        "hard link unavailable, falling back"
                    );
                    err_link = Some(e);
                }
            },
            EnumCopyAttempt::StreamCopy => {
                return _stream_file_contents(&info_src, path_file_dst)
                    .map(|n_bytes| {
                        debug!(
                            src = %path_file_src.display(),
                            dst = %path_file_dst.display(),
                            n_bytes,
                            "streamed"
                        );
                        EnumCopyOutcome::Streamed
                    })
                    .map_err(|e| FsError::Copy {
                        src: path_file_src.to_path_buf(),
                        dst: path_file_dst.to_path_buf(),
                        source: e,
                        link_error: err_link.map(|x| x.to_string()),
                    });
            }
        }
    }

    Err(FsError::Copy {
        src: path_file_src.to_path_buf(),
        dst: path_file_dst.to_path_buf(),
        source: err_link.unwrap_or_else(|| io::Error::other("no copy attempt configured")),
        link_error: None,
    })
}

fn _stream_file_contents(info_src: &SpecPathInfo, path_file_dst: &Path) -> io::Result<u64> {
    let mut file_src = open_for_read(&info_src.path)?;
    let mode_src = info_src.mode().unwrap_or(0o644);
    let mut file_dst = create_or_truncate_for_write(path_file_dst, mode_src)?;
    let n_bytes = io::copy(&mut file_src, &mut file_dst)?;
    file_dst.sync_all()?;
    Ok(n_bytes)
}

/// `cp`-like single file copy.
///
/// When `destination` is an existing directory the file is copied into it
/// under its own name. Otherwise the parent of `destination` must already
/// exist. The actual copy goes through [`copy_file`].
pub fn copy_to<P, Q>(file_source: P, destination: Q) -> Result<EnumCopyOutcome, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    let path_dst = destination.as_ref();

    if !classify_path(path_file_src)?.if_exists() {
        return Err(FsError::NotFound {
            path: path_file_src.to_path_buf(),
        });
    }

    let path_file_dst = if classify_path(path_dst)?.is_dir() {
        let Some(name_file) = path_file_src.file_name() else {
            return Err(FsError::NotRegularFile {
                path: path_file_src.to_path_buf(),
                kind: EnumPathKind::Other,
            });
        };
        path_dst.join(name_file)
    } else {
        let path_parent = match path_dst.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !classify_path(&path_parent)?.is_dir() {
            return Err(FsError::NotFound { path: path_parent });
        }
        path_dst.to_path_buf()
    };

    copy_file(path_file_src, path_file_dst)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TreeCopy

/// Recreate the tree under `dir_source` at `dir_destination`.
///
/// One-directional overlay: entries only present at the destination are
/// left alone, existing destination files are overwritten, and existing
/// destination directories keep their permissions. Directories created by
/// the call take the mode of their source directory. Files go through
/// [`copy_file`], so they may end up hard-linked to their source.
///
/// Depth-first, children in name order. The first failure aborts the walk
/// and is returned with the exact path involved; whatever was copied
/// before it stays on disk.
pub fn sync_tree<P, Q>(dir_source: P, dir_destination: Q) -> Result<ReportSync, FsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref();
    let path_dir_dst = dir_destination.as_ref();

    let info_src = classify_path_follow(path_dir_src)?;
    let Some(mode_src) = info_src.mode() else {
        return Err(FsError::NotFound {
            path: path_dir_src.to_path_buf(),
        });
    };
    if !info_src.is_dir() {
        return Err(FsError::NotDirectory {
            path: path_dir_src.to_path_buf(),
        });
    }
    if is_nested_inside(path_dir_src, path_dir_dst) {
        return Err(FsError::DestinationInsideSource {
            source_dir: path_dir_src.to_path_buf(),
            destination: path_dir_dst.to_path_buf(),
        });
    }

    let info_dst = classify_path_follow(path_dir_dst)?;
    let mut builder_sync_report = ReportSyncBuilder::default();
    _sync_dir(path_dir_src, mode_src, &info_dst, &mut builder_sync_report)?;

    let report_sync = builder_sync_report.build();
    info!(
        src = %path_dir_src.display(),
        dst = %path_dir_dst.display(),
        "{report_sync}"
    );
    Ok(report_sync)
}

/// `info_dir_dst` is probed by the caller: the roots follow symlinks,
/// nested destinations do not.
fn _sync_dir(
    path_dir_src: &Path,
    mode_dir_src: u32,
    info_dir_dst: &SpecPathInfo,
    builder_sync_report: &mut ReportSyncBuilder,
) -> Result<(), FsError> {
    let path_dir_dst = info_dir_dst.path.as_path();
    trace!(src = %path_dir_src.display(), dst = %path_dir_dst.display(), "visit");

    match info_dir_dst.kind() {
        None => {
            make_directory_all(path_dir_dst, mode_dir_src)?;
            debug!(dst = %path_dir_dst.display(), mode = mode_dir_src, "created directory");
            builder_sync_report.add_dir_created();
        }
        Some(EnumPathKind::Directory) => builder_sync_report.add_dir_existing(),
        Some(_) => {
            return Err(FsError::NotDirectory {
                path: path_dir_dst.to_path_buf(),
            });
        }
    }

    for entry in list_directory_entries(path_dir_src)? {
        let Some(name_entry) = entry.path.file_name() else {
            continue;
        };
        let path_child_dst = path_dir_dst.join(name_entry);

        // Files are classified inside `copy_file`; only directories need
        // their mode here.
        if entry.kind != EnumPathKind::Directory {
            let enum_outcome = copy_file(&entry.path, &path_child_dst)?;
            builder_sync_report.add_file_outcome(enum_outcome);
            continue;
        }
        let info_child_src = classify_path(&entry.path)?;
        let Some(mode_child) = info_child_src.mode() else {
            return Err(FsError::NotFound { path: entry.path });
        };
        if !info_child_src.is_dir() {
            return Err(FsError::NotDirectory { path: entry.path });
        }
        let info_child_dst = classify_path(&path_child_dst)?;
        _sync_dir(&entry.path, mode_child, &info_child_dst, builder_sync_report)?;
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
