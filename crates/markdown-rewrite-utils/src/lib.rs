//! Shared utilities for markdown-rewrite crates.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tempfile::Builder;

/// Map a function over the items in parallel, preserving input order in the
/// returned results.
pub fn parallel_map<I, R, F>(items: Vec<I>, func: F) -> Vec<R>
where
    I: Send,
    R: Send,
    F: Fn(I) -> R + Send + Sync,
{
    items.into_par_iter().map(func).collect()
}

/// Replace the contents of `path` without readers ever observing partial
/// content: the new text is staged in a sibling temporary file, synced, and
/// renamed over the target. Permissions of an existing target are kept.
pub fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&parent)?;

    let mut staged = Builder::new()
        .prefix(".markdown-rewrite")
        .tempfile_in(&parent)?;
    staged.as_file_mut().write_all(contents.as_bytes())?;
    staged.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let mode = metadata.permissions().mode();
            let _ = fs::set_permissions(staged.path(), fs::Permissions::from_mode(mode));
        }
    }

    staged.persist(path).map(|_| ()).map_err(|err| err.error)
}
