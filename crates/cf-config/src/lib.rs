//! Configuration management for the CIfly documentation content graph.
//!
//! Parses `cifly.toml` with serde and provides auto-discovery of the config
//! file in parent directories. The file tells the content loaders where each
//! collection's sources live:
//!
//! ```toml
//! [content.ruletables_raw]
//! kind = "raw_files"
//! dirs = ["../ruletables"]
//! extensions = [".txt"]
//!
//! [content.code_raw]
//! kind = "raw_files"
//! dirs = ["../examples/ciflypy-examples/ciflypy_examples", "../examples/ciflyr-examples/R"]
//! extensions = [".py", ".R"]
//! keep_extension = true
//!
//! [content.applications]
//! kind = "markup"
//! dir = "src/content/applications"
//!
//! [content.references]
//! kind = "data_file"
//! path = "src/content/references/papers.json"
//!
//! [cache]
//! enabled = true
//! ```
//!
//! Every collection has a default matching the site's layout, so an empty file
//! (or no file at all) is a valid configuration.
//!
//! ## Path Expansion
//!
//! Path strings support shell-style expansion before they are resolved against
//! the config file's directory:
//!
//! - `${VAR}` or `$VAR` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - `~` at the start - expands to the home directory

mod paths;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "cifly.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-collection source configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Collection cache configuration.
    pub cache: CacheConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Collection cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether loaded collections are cached between builds (watch/dev mode).
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Raw source configuration as parsed from TOML (paths as strings).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SourceConfigRaw {
    RawFiles {
        dirs: Vec<String>,
        extensions: Vec<String>,
        #[serde(default)]
        keep_extension: bool,
    },
    Markup {
        dir: String,
        #[serde(default = "default_markup_extensions")]
        extensions: Vec<String>,
    },
    DataFile {
        path: String,
    },
}

fn default_markup_extensions() -> Vec<String> {
    vec![".md".to_owned(), ".mdx".to_owned()]
}

impl SourceConfigRaw {
    fn raw_files(dirs: &[&str], extensions: &[&str], keep_extension: bool) -> Self {
        Self::RawFiles {
            dirs: dirs.iter().map(|d| (*d).to_owned()).collect(),
            extensions: extensions.iter().map(|e| (*e).to_owned()).collect(),
            keep_extension,
        }
    }

    fn markup(dir: &str) -> Self {
        Self::Markup {
            dir: dir.to_owned(),
            extensions: default_markup_extensions(),
        }
    }
}

/// Raw content configuration: one optional table per collection.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ContentConfigRaw {
    ruletables_raw: Option<SourceConfigRaw>,
    ruletables: Option<SourceConfigRaw>,
    code_raw: Option<SourceConfigRaw>,
    applications: Option<SourceConfigRaw>,
    references: Option<SourceConfigRaw>,
    docs: Option<SourceConfigRaw>,
}

/// Resolved source of one collection, with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// One plain-text file per entity across one or more directories.
    RawFiles {
        /// Directories to read (merged; ids must be unique across them).
        dirs: Vec<PathBuf>,
        /// Accepted extensions including the leading dot.
        extensions: Vec<String>,
        /// Keep the extension in entity ids.
        keep_extension: bool,
    },
    /// One markup file with front-matter per entity.
    Markup {
        /// Directory to read.
        dir: PathBuf,
        /// Accepted extensions including the leading dot.
        extensions: Vec<String>,
    },
    /// One structured data file holding every entity.
    DataFile {
        /// JSON or YAML file.
        path: PathBuf,
    },
}

/// Resolved content configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// Rule-table definitions (`ruletables_raw`).
    pub ruletables_raw: SourceConfig,
    /// Rule-table pages (`ruletables`).
    pub ruletables: SourceConfig,
    /// Example code (`code_raw`).
    pub code_raw: SourceConfig,
    /// Application pages (`applications`).
    pub applications: SourceConfig,
    /// Bibliography (`references`).
    pub references: SourceConfig,
    /// Documentation pages (`docs`).
    pub docs: SourceConfig,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self::defaults_at(Path::new("."))
    }
}

impl ContentConfig {
    /// Default sources resolved against `base`.
    #[must_use]
    pub fn defaults_at(base: &Path) -> Self {
        let resolve = |collection| default_resolved(collection, base);
        Self {
            ruletables_raw: resolve("ruletables_raw"),
            ruletables: resolve("ruletables"),
            code_raw: resolve("code_raw"),
            applications: resolve("applications"),
            references: resolve("references"),
            docs: resolve("docs"),
        }
    }
}

/// Resolve a collection's default source without env expansion.
fn default_resolved(collection: &str, base: &Path) -> SourceConfig {
    match default_source(collection) {
        SourceConfigRaw::RawFiles {
            dirs,
            extensions,
            keep_extension,
        } => SourceConfig::RawFiles {
            dirs: dirs.iter().map(|d| base.join(d)).collect(),
            extensions,
            keep_extension,
        },
        SourceConfigRaw::Markup { dir, extensions } => SourceConfig::Markup {
            dir: base.join(dir),
            extensions,
        },
        SourceConfigRaw::DataFile { path } => SourceConfig::DataFile {
            path: base.join(path),
        },
    }
}

/// Default source for a collection, matching the documentation site's layout.
fn default_source(collection: &str) -> SourceConfigRaw {
    match collection {
        "ruletables_raw" => SourceConfigRaw::raw_files(&["../ruletables"], &[".txt"], false),
        "code_raw" => SourceConfigRaw::raw_files(
            &[
                "../examples/ciflypy-examples/ciflypy_examples",
                "../examples/ciflyr-examples/R",
            ],
            &[".py", ".R"],
            true,
        ),
        "references" => SourceConfigRaw::DataFile {
            path: "src/content/references/papers.json".to_owned(),
        },
        other => SourceConfigRaw::markup(&format!("src/content/{other}")),
    }
}

/// Expand, validate and resolve one source against the config directory.
fn resolve_source(
    source: &SourceConfigRaw,
    config_dir: &Path,
    collection: &str,
) -> Result<SourceConfig, ConfigError> {
    let field = format!("content.{collection}");
    let resolve_path = |value: &str, key: &str| {
        paths::resolve_source_path(value, config_dir, &format!("{field}.{key}"))
    };

    match source {
        SourceConfigRaw::RawFiles {
            dirs,
            extensions,
            keep_extension,
        } => {
            if dirs.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{field}.dirs must list at least one directory"
                )));
            }
            require_extensions(extensions, &field)?;
            Ok(SourceConfig::RawFiles {
                dirs: dirs
                    .iter()
                    .map(|d| resolve_path(d, "dirs"))
                    .collect::<Result<_, _>>()?,
                extensions: extensions.clone(),
                keep_extension: *keep_extension,
            })
        }
        SourceConfigRaw::Markup { dir, extensions } => {
            require_extensions(extensions, &field)?;
            Ok(SourceConfig::Markup {
                dir: resolve_path(dir, "dir")?,
                extensions: extensions.clone(),
            })
        }
        SourceConfigRaw::DataFile { path } => Ok(SourceConfig::DataFile {
            path: resolve_path(path, "path")?,
        }),
    }
}

/// Require a non-empty list of dot-prefixed extensions.
fn require_extensions(extensions: &[String], field: &str) -> Result<(), ConfigError> {
    if extensions.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field}.extensions cannot be empty"
        )));
    }
    if let Some(bad) = extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
        return Err(ConfigError::Validation(format!(
            "{field}.extensions: \"{bad}\" must start with '.' followed by at least one character"
        )));
    }
    Ok(())
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`content.code_raw.dirs`").
        field: String,
        /// Error message (e.g., "${`EXAMPLES_ROOT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `cifly.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)
        } else {
            Ok(Self::default_with_cwd())
        }
    }

    /// Parse configuration from TOML content, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, env expansion or validation fails.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve_paths(base)?;
        Ok(config)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            content: ContentConfigRaw::default(),
            cache: CacheConfig::default(),
            content_resolved: ContentConfig::defaults_at(base),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand env vars, validate and resolve every collection source.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let raw = &self.content;
        let resolve = |collection: &str, source: Option<&SourceConfigRaw>| match source {
            Some(source) => resolve_source(source, config_dir, collection),
            None => Ok(default_resolved(collection, config_dir)),
        };

        self.content_resolved = ContentConfig {
            ruletables_raw: resolve("ruletables_raw", raw.ruletables_raw.as_ref())?,
            ruletables: resolve("ruletables", raw.ruletables.as_ref())?,
            code_raw: resolve("code_raw", raw.code_raw.as_ref())?,
            applications: resolve("applications", raw.applications.as_ref())?,
            references: resolve("references", raw.references.as_ref())?,
            docs: resolve("docs", raw.docs.as_ref())?,
        };
        Ok(())
    }
}
