//! Rewrites one documentation page's Markdown source before rendering.
//!
//! Two passes run in order: relative source links are rebased onto the
//! configured edit URI, then blockquote callout lines are converted to the
//! indented admonition syntax. Both passes are plain regex substitutions over
//! the raw text; text that matches neither pattern passes through unchanged.

mod admonition;
mod hook;
mod link;

pub use admonition::{AdmonitionRewriter, ADMONITION_KEYWORDS};
pub use hook::{HookArgs, PageContext};
pub use link::{LinkRewriter, SOURCE_ANCHORS};

use thiserror::Error;

/// Errors surfaced while assembling a rewriter.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("missing configuration: edit_uri is not set")]
    MissingEditUri,
}

pub type RewriteResult<T> = Result<T, RewriteError>;

/// Page rewriter combining both passes. Stateless after construction; a
/// single instance may be shared across threads.
#[derive(Debug)]
pub struct PageRewriter {
    links: LinkRewriter,
    admonitions: AdmonitionRewriter,
}

impl PageRewriter {
    /// Build a rewriter for the given edit URI. The URI is used verbatim as
    /// the link prefix; an unset value is a caller precondition violation.
    pub fn new(edit_uri: &str) -> RewriteResult<Self> {
        if edit_uri.trim().is_empty() {
            return Err(RewriteError::MissingEditUri);
        }
        Ok(PageRewriter {
            links: LinkRewriter::new(edit_uri),
            admonitions: AdmonitionRewriter::new(),
        })
    }

    /// Rewrite one page. The admonition pass operates on the output of the
    /// link pass.
    pub fn rewrite(&self, markdown: &str) -> String {
        let rebased = self.links.rewrite(markdown);
        self.admonitions.rewrite(&rebased)
    }

    /// Entry point matching the build pipeline's calling convention. The
    /// page descriptor and extra context are accepted for compatibility and
    /// not read.
    pub fn rewrite_page(&self, markdown: &str, _page: &PageContext, _extra: &HookArgs) -> String {
        self.rewrite(markdown)
    }
}
