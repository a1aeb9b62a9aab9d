//! Configuration primitives and loader for the markdown-rewrite toolkit.
//!
//! The loader resolves configuration using a precedence stack:
//! command-line flag → override file → working directory → git root →
//! built-in defaults. Parsed settings are normalised into typed structures
//! so downstream crates can operate without touching raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".markdown-rewrite.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteSettings,
    pub pages: PageSettings,
    pub sources: ConfigSources,
}

/// Settings describing the hosted repository the rewritten links point at.
#[derive(Clone, Debug)]
pub struct SiteSettings {
    pub name: Option<String>,
    /// Base URL prefix for rewritten source links. Required; used verbatim
    /// by the rewriter with no normalisation.
    pub edit_uri: String,
}

/// Settings that govern which pages a tree run visits.
#[derive(Clone, Debug)]
pub struct PageSettings {
    pub root: PathBuf,
    pub include: PatternList,
    pub exclude: PatternList,
}

/// Pattern plus compiled matcher helper.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    glob: Glob,
}

impl Pattern {
    fn new(source: ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                original: value,
                glob,
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn glob(&self) -> &Glob {
        &self.glob
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Compile one matcher per pattern.
    pub fn matchers(&self) -> Vec<GlobMatcher> {
        self.patterns
            .iter()
            .map(|pattern| pattern.glob().compile_matcher())
            .collect()
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override/flag).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn flag(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Flag,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (ConfigSourceKind::Flag, _) => "command-line flag".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
    Flag,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
            ConfigSourceKind::Flag => "command-line flag",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub edit_uri: Option<String>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    pub fn with_edit_uri(mut self, uri: impl Into<String>) -> Self {
        self.edit_uri = Some(uri.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed
    /// settings. A missing `site.edit_uri` is a validation failure: the
    /// rewriter must never run with an unset link prefix.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(edit_uri) = options.edit_uri {
            let source = ConfigSource::flag(working_dir.clone());
            merged.merge(PartialConfig {
                site: Some(SitePartial {
                    edit_uri: Some(Located::new(edit_uri, source.clone())),
                    ..SitePartial::default()
                }),
                pages: None,
            });
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            site: resolved.site,
            pages: resolved.pages,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let pages = PagesPartial {
        root: Some(Located::new(PathBuf::from("."), source.clone())),
        include: Some(Located::new(vec!["**/*.md".into()], source.clone())),
        exclude: Some(Located::new(
            vec!["**/node_modules/**".into(), "**/vendor/**".into()],
            source.clone(),
        )),
    };

    PartialConfig {
        site: Some(SitePartial::default()),
        pages: Some(pages),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    site: Option<SitePartial>,
    pages: Option<PagesPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_site) = other.site.take() {
            match &mut self.site {
                Some(site) => site.merge(other_site),
                None => self.site = Some(other_site),
            }
        }

        if let Some(other_pages) = other.pages.take() {
            match &mut self.pages {
                Some(pages) => pages.merge(other_pages),
                None => self.pages = Some(other_pages),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let site_partial = self.site.unwrap_or_default();
        let edit_uri = match &site_partial.edit_uri {
            Some(located) if !located.value.trim().is_empty() => located.value.clone(),
            Some(located) => {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source.clone()),
                        "site.edit_uri cannot be empty".into(),
                    )
                    .with_context("site.edit_uri"),
                );
                String::new()
            }
            None => {
                errors.push(
                    ConfigValidationError::new(
                        None,
                        "site.edit_uri is not configured (set it in .markdown-rewrite.toml or pass --edit-uri)"
                            .into(),
                    )
                    .with_context("site.edit_uri"),
                );
                String::new()
            }
        };

        let pages_partial = self.pages.unwrap_or_default();
        let root_loc = pages_partial.root.unwrap_or_else(|| {
            Located::new(
                PathBuf::from("."),
                ConfigSource::default(PathBuf::from(".")),
            )
        });
        let root = resolve_path(&root_loc);

        let include = compile_patterns(
            pages_partial.include.unwrap_or_default(),
            "pages.include",
            &mut errors,
        );
        let exclude = compile_patterns(
            pages_partial.exclude.unwrap_or_default(),
            "pages.exclude",
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            site: SiteSettings {
                name: site_partial.name.map(|name| name.value),
                edit_uri,
            },
            pages: PageSettings {
                root,
                include: PatternList::new(include),
                exclude: PatternList::new(exclude),
            },
        })
    }
}

#[derive(Clone, Debug, Default)]
struct SitePartial {
    name: Option<Located<String>>,
    edit_uri: Option<Located<String>>,
}

impl SitePartial {
    fn merge(&mut self, other: SitePartial) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.edit_uri.is_some() {
            self.edit_uri = other.edit_uri;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct PagesPartial {
    root: Option<Located<PathBuf>>,
    include: Option<Located<Vec<String>>>,
    exclude: Option<Located<Vec<String>>>,
}

impl PagesPartial {
    fn merge(&mut self, other: PagesPartial) {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.include.is_some() {
            self.include = other.include;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

impl Default for Located<Vec<String>> {
    fn default() -> Self {
        Located::new(Vec::new(), ConfigSource::default(PathBuf::from(".")))
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn compile_patterns(
    located: Located<Vec<String>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(located.source.clone(), pattern) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    site: SiteSettings,
    pages: PageSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    site: Option<RawSite>,
    #[serde(default)]
    pages: Option<RawPages>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            site: self.site.map(|site| site.into_partial(source.clone())),
            pages: self.pages.map(|pages| pages.into_partial(source)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    edit_uri: Option<String>,
}

impl RawSite {
    fn into_partial(self, source: ConfigSource) -> SitePartial {
        SitePartial {
            name: self.name.map(|value| Located::new(value, source.clone())),
            edit_uri: self.edit_uri.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPages {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

impl RawPages {
    fn into_partial(self, source: ConfigSource) -> PagesPartial {
        PagesPartial {
            root: self.root.map(|value| Located::new(value, source.clone())),
            include: self
                .include
                .map(|value| Located::new(value, source.clone())),
            exclude: self.exclude.map(|value| Located::new(value, source)),
        }
    }
}
