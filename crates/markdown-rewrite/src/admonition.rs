use regex::{Captures, Regex};

/// Callout keywords recognised by the documentation theme.
pub const ADMONITION_KEYWORDS: &[&str] = &[
    "Note", "Abstract", "Info", "Tip", "Success", "Question", "Warning", "Failure", "Danger",
    "Bug", "Example", "Quote",
];

/// Converts blockquote callouts (`> Keyword: text`) into the indented
/// admonition syntax the theme renders (`!!! Keyword` + indented body).
///
/// Matching is anchored to line starts and case-insensitive; the emitted
/// marker keeps the keyword's casing as written. Lines with unrecognised
/// keywords are left alone.
#[derive(Debug)]
pub struct AdmonitionRewriter {
    pattern: Regex,
}

impl AdmonitionRewriter {
    pub fn new() -> Self {
        let pattern = format!(r"(?mi)^> ({}): (.+)", ADMONITION_KEYWORDS.join("|"));
        AdmonitionRewriter {
            pattern: Regex::new(&pattern).expect("callout pattern compiles"),
        }
    }

    pub fn rewrite(&self, markdown: &str) -> String {
        self.pattern
            .replace_all(markdown, |caps: &Captures<'_>| {
                format!("!!! {}\n\n    {}", &caps[1], &caps[2])
            })
            .into_owned()
    }
}

impl Default for AdmonitionRewriter {
    fn default() -> Self {
        Self::new()
    }
}
