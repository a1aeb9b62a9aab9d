use regex::{Captures, Regex};

/// Anchors that mark a relative path as pointing back into the repository:
/// the source tree, fixtures, tests, env-file templates, and the linter
/// configuration file.
pub const SOURCE_ANCHORS: &[&str] = &["src/", "fixtures/", "tests/", ".env", ".coderabbit.yaml"];

const LINK_PATTERN: &str = r"(?:\.\./)+(src/|fixtures/|tests/|\.env(?:\..+)?|\.coderabbit\.yaml)";

/// Rewrites `../`-relative source links into links rooted at the hosted
/// repository browser.
///
/// Pages reference source files through filesystem paths that only resolve
/// inside a checkout (`../../src/foo.py`); published pages need absolute
/// links under the configured edit URI instead. The `../` repetitions are
/// dropped and the edit URI is prepended by straight concatenation; no URL
/// normalization is performed.
#[derive(Debug)]
pub struct LinkRewriter {
    pattern: Regex,
    edit_uri: String,
}

impl LinkRewriter {
    pub fn new(edit_uri: &str) -> Self {
        LinkRewriter {
            pattern: Regex::new(LINK_PATTERN).expect("link pattern compiles"),
            edit_uri: edit_uri.to_owned(),
        }
    }

    /// Replace every non-overlapping occurrence, left to right. Rewritten
    /// links no longer contain `../`, so a second application is a no-op.
    pub fn rewrite(&self, markdown: &str) -> String {
        self.pattern
            .replace_all(markdown, |caps: &Captures<'_>| {
                let anchor = caps[1].trim_end_matches('/');
                format!("{}{}/", self.edit_uri, anchor)
            })
            .into_owned()
    }
}
