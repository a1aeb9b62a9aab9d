use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

/// Descriptor for the page being rewritten. Build pipelines pass one per
/// invocation; the rewriter itself never reads it.
#[derive(Clone, Debug, Default)]
pub struct PageContext {
    pub source_path: Option<PathBuf>,
    pub title: Option<String>,
}

impl PageContext {
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        PageContext {
            source_path: Some(path.into()),
            title: None,
        }
    }
}

/// Free-form keyword context forwarded by evolving pipeline calling
/// conventions. Accepted and ignored by the rewriter.
#[derive(Clone, Debug, Default)]
pub struct HookArgs {
    entries: BTreeMap<String, Value>,
}

impl HookArgs {
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
