use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use markdown_rewrite_config::Config;
use walkdir::WalkDir;

use crate::OperationError;

/// Collect the pages a tree run should visit, as paths relative to the
/// configured root, sorted for deterministic reporting.
pub(crate) fn collect_pages(
    config: &Config,
    restrict: &[PathBuf],
) -> Result<Vec<PathBuf>, OperationError> {
    let root = &config.pages.root;
    let restrict = normalize_restrictions(restrict, root)?;
    let include = config.pages.include.matchers();
    let exclude = config.pages.exclude.matchers();

    let mut pages = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();

        if !matches_any(&include, &relative) || matches_any(&exclude, &relative) {
            continue;
        }
        if !restrict.is_empty() && !under_any(&restrict, &relative) {
            continue;
        }

        pages.push(relative);
    }

    pages.sort();
    Ok(pages)
}

/// Restriction paths are accepted relative to the pages root; absolute paths
/// must point inside it.
fn normalize_restrictions(
    restrict: &[PathBuf],
    root: &Path,
) -> Result<Vec<PathBuf>, OperationError> {
    restrict
        .iter()
        .map(|candidate| {
            if candidate.is_absolute() {
                candidate
                    .strip_prefix(root)
                    .map(Path::to_path_buf)
                    .map_err(|_| {
                        OperationError::InvalidInput(format!(
                            "path '{}' is outside the pages root '{}'",
                            candidate.display(),
                            root.display()
                        ))
                    })
            } else {
                Ok(candidate.clone())
            }
        })
        .collect()
}

fn matches_any(matchers: &[GlobMatcher], path: &Path) -> bool {
    matchers.iter().any(|matcher| matcher.is_match(path))
}

fn under_any(restrict: &[PathBuf], relative: &Path) -> bool {
    restrict
        .iter()
        .any(|candidate| relative.starts_with(candidate))
}

fn walk_error(root: &Path, err: walkdir::Error) -> OperationError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    OperationError::Io {
        path,
        source: err.into(),
    }
}
