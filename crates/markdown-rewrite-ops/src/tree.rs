use std::fs;
use std::path::{Path, PathBuf};

use markdown_rewrite::PageContext;
use markdown_rewrite_utils::{atomic_write, parallel_map};
use similar::TextDiff;

use crate::{scan, OperationError, Operations};

/// How a tree run treats pages that need rewriting.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RewriteMode {
    /// Report pages that would change without touching them.
    #[default]
    Check,
    /// Print unified diffs for pages that would change.
    Diff,
    /// Rewrite pages in place.
    Write,
}

#[derive(Clone, Debug, Default)]
pub struct TreeOptions {
    /// Restrict the run to these paths under the pages root. Empty visits
    /// every page.
    pub paths: Vec<PathBuf>,
    pub mode: RewriteMode,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageStatus {
    Changed,
    Unchanged,
}

/// Per-page result of a tree run.
#[derive(Clone, Debug)]
pub struct PageChange {
    pub path: PathBuf,
    pub status: PageStatus,
    pub diff: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TreeOutcome {
    pub changes: Vec<PageChange>,
    pub files_scanned: usize,
    pub rewritten: usize,
    pub exit_code: i32,
}

pub(crate) fn run(ops: &Operations, options: TreeOptions) -> Result<TreeOutcome, OperationError> {
    let config = ops.config();
    let targets = scan::collect_pages(config, &options.paths)?;
    let files_scanned = targets.len();
    let root = config.pages.root.clone();
    let mode = options.mode;

    // parallel_map preserves the scan order in the collected results.
    let results = parallel_map(targets, |relative| {
        process_page(ops, &root, relative, mode)
    });
    let changes = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let rewritten = changes
        .iter()
        .filter(|change| change.status == PageStatus::Changed)
        .count();
    let exit_code = match mode {
        RewriteMode::Write => 0,
        RewriteMode::Check | RewriteMode::Diff => i32::from(rewritten > 0),
    };

    Ok(TreeOutcome {
        changes,
        files_scanned,
        rewritten,
        exit_code,
    })
}

fn process_page(
    ops: &Operations,
    root: &Path,
    relative: PathBuf,
    mode: RewriteMode,
) -> Result<PageChange, OperationError> {
    let absolute = root.join(&relative);
    let contents = fs::read_to_string(&absolute).map_err(|source| OperationError::Io {
        path: absolute.clone(),
        source,
    })?;

    let page = PageContext::for_path(relative.clone());
    let rewritten = ops.rewrite_page(&contents, &page);

    if rewritten == contents {
        return Ok(PageChange {
            path: relative,
            status: PageStatus::Unchanged,
            diff: None,
        });
    }

    let diff = match mode {
        RewriteMode::Diff => Some(render_diff(&relative, &contents, &rewritten)),
        RewriteMode::Check | RewriteMode::Write => None,
    };

    if mode == RewriteMode::Write {
        atomic_write(&absolute, &rewritten).map_err(|source| OperationError::Io {
            path: absolute,
            source,
        })?;
    }

    Ok(PageChange {
        path: relative,
        status: PageStatus::Changed,
        diff,
    })
}

fn render_diff(path: &Path, original: &str, rewritten: &str) -> String {
    TextDiff::from_lines(original, rewritten)
        .unified_diff()
        .context_radius(3)
        .header(
            &format!("a/{}", path.display()),
            &format!("b/{}", path.display()),
        )
        .to_string()
}
