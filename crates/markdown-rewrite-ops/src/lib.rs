//! High-level operations shared by markdown-rewrite commands.

mod scan;
mod tree;

pub use tree::{PageChange, PageStatus, RewriteMode, TreeOptions, TreeOutcome};

use std::io;
use std::path::PathBuf;

use markdown_rewrite::{HookArgs, PageContext, PageRewriter, RewriteError};
use markdown_rewrite_config::Config;
use thiserror::Error;

/// Errors surfaced by the operations layer.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Operation bundle the CLI and tooling hook into.
pub struct Operations {
    config: Config,
    rewriter: PageRewriter,
}

impl Operations {
    /// Assemble the operation layer from configuration. Fails when the
    /// configured edit URI cannot seed a rewriter.
    pub fn new(config: Config) -> Result<Self, OperationError> {
        let rewriter = PageRewriter::new(&config.site.edit_uri)?;
        Ok(Operations { config, rewriter })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rewrite a single page supplied as text along with its descriptor.
    pub fn rewrite_page(&self, markdown: &str, page: &PageContext) -> String {
        self.rewriter
            .rewrite_page(markdown, page, &HookArgs::default())
    }

    /// Run the rewriter over every page under the configured root.
    pub fn rewrite_tree(&self, options: TreeOptions) -> Result<TreeOutcome, OperationError> {
        tree::run(self, options)
    }
}
