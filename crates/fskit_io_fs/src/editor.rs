//! Open a file in the user's editor and wait for it to exit.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::spec::FsError;

/// Editor used when neither `VISUAL` nor `EDITOR` is set.
pub const C_EDITOR_FALLBACK: &str = "vi";

/// Pick the editor command: `VISUAL`, then `EDITOR`, then [`C_EDITOR_FALLBACK`].
///
/// Blank values are skipped.
pub fn resolve_editor<F>(lookup_env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(|key| lookup_env(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| C_EDITOR_FALLBACK.to_string())
}

/// Run `editor` (whitespace-split, e.g. `"code --wait"`) on `path` and block
/// until it exits.
pub fn edit_file_with<P: AsRef<Path>>(editor: &str, path: P) -> Result<(), FsError> {
    let path = path.as_ref();
    let map_editor_err = |message: String| FsError::Editor {
        editor: editor.to_string(),
        path: path.to_path_buf(),
        message,
    };

    let mut iter_parts = editor.split_whitespace();
    let Some(c_program) = iter_parts.next() else {
        return Err(map_editor_err("empty editor command".to_string()));
    };

    debug!(editor, path = %path.display(), "launching editor");
    let status = Command::new(c_program)
        .args(iter_parts)
        .arg(path)
        .status()
        .map_err(|e| map_editor_err(e.to_string()))?;
    if !status.success() {
        return Err(map_editor_err(format!("exited with {status}")));
    }
    Ok(())
}

/// [`edit_file_with`] using the editor from the process environment.
pub fn edit_file<P: AsRef<Path>>(path: P) -> Result<(), FsError> {
    let editor = resolve_editor(|key| std::env::var(key).ok());
    edit_file_with(&editor, path)
}
