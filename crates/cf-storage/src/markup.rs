//! Markup sources: one markdown/MDX file per entity with YAML front-matter.
//!
//! The front-matter becomes the entity's record; the body is carried along
//! untouched for the rendering layer.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::raw::ExtensionFilter;
use crate::storage::{Storage, StorageError};

/// Front-matter key that overrides the filename-derived slug.
const SLUG_KEY: &str = "slug";

/// A markup file split into front-matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupFile {
    /// Entity id: front-matter `slug` if present, else the slugified file stem.
    pub slug: String,
    /// Path the file was read from.
    pub path: PathBuf,
    /// Parsed front-matter (empty if the file has none).
    pub frontmatter: Map<String, Value>,
    /// Everything after the closing front-matter fence.
    pub body: String,
}

/// Split content into the raw YAML front-matter and the body.
///
/// Front-matter must start on the first line (an optional BOM is ignored) with
/// `---` and end with a line containing only `---` or `...`. Content without an
/// opening fence has no front-matter.
///
/// Returns `Err` with a message if the opening fence is never closed.
pub(crate) fn split_frontmatter(content: &str) -> Result<(Option<&str>, &str), String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(first_line_end) = content.find('\n') else {
        return Ok((None, content));
    };
    if content[..first_line_end].trim_end() != "---" {
        return Ok((None, content));
    }

    let yaml_start = first_line_end + 1;
    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((Some(yaml), body));
        }
        offset += line.len();
    }

    Err("front-matter opened with '---' is never closed".to_owned())
}

/// Parse a YAML front-matter block into a JSON object.
///
/// Empty front-matter yields an empty map. Anything other than a mapping at the
/// top level is rejected.
pub(crate) fn parse_frontmatter(yaml: &str) -> Result<Map<String, Value>, String> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| format!("Invalid YAML front-matter: {e}"))?;
    let value: Value = serde_json::to_value(value)
        .map_err(|e| format!("Front-matter cannot be represented as JSON: {e}"))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err("front-matter must be a YAML mapping".to_owned()),
    }
}

/// Convert a file stem into a URL slug.
///
/// Lowercases, turns spaces into `-` and drops punctuation other than `-` and `_`.
///
/// # Examples
///
/// ```
/// use cf_storage::slugify;
///
/// assert_eq!(slugify("Optimal IV"), "optimal-iv");
/// assert_eq!(slugify("min_dsep"), "min_dsep");
/// assert_eq!(slugify("What's new?"), "whats-new");
/// ```
#[must_use]
pub fn slugify(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    for c in stem.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            slug.push(c);
        } else if c == ' ' {
            slug.push('-');
        }
    }
    slug
}

/// Parse one markup file's content.
///
/// # Errors
///
/// Returns an `InvalidFormat` [`StorageError`] for unterminated or malformed
/// front-matter, or when the file name yields an empty slug.
pub fn parse_markup(path: &Path, stem: &str, content: &str) -> Result<MarkupFile, StorageError> {
    let (yaml, body) =
        split_frontmatter(content).map_err(|detail| StorageError::invalid_format(path, detail))?;
    let frontmatter = match yaml {
        Some(yaml) => {
            parse_frontmatter(yaml).map_err(|detail| StorageError::invalid_format(path, detail))?
        }
        None => Map::new(),
    };

    let slug = match frontmatter.get(SLUG_KEY) {
        Some(Value::String(slug)) if !slug.is_empty() => slug.clone(),
        _ => slugify(stem),
    };
    if slug.is_empty() {
        return Err(StorageError::invalid_format(
            path,
            format!("file name \"{stem}\" has no characters usable in a slug"),
        ));
    }

    Ok(MarkupFile {
        slug,
        path: path.to_path_buf(),
        frontmatter,
        body: body.to_owned(),
    })
}

/// Read every markup file in `dir` accepted by `filter`.
///
/// Ordering and skipping rules match [`read_raw_directory`](crate::read_raw_directory).
///
/// # Errors
///
/// Returns [`StorageError`] if `dir` is missing or unreadable, or if any matching
/// file cannot be read or has malformed front-matter.
pub fn read_markup_directory(
    storage: &dyn Storage,
    dir: &Path,
    filter: &ExtensionFilter,
) -> Result<Vec<MarkupFile>, StorageError> {
    let entries = storage.list(dir)?;

    let mut files = Vec::new();
    for entry in entries {
        if !entry.is_file || entry.name.starts_with('.') {
            continue;
        }
        let Some(ext) = filter.matched(&entry.name) else {
            continue;
        };
        let stem = &entry.name[..entry.name.len() - ext.len()];
        let content = storage.read(&entry.path)?;
        files.push(parse_markup(&entry.path, stem, &content)?);
    }

    tracing::debug!(dir = %dir.display(), count = files.len(), "Read markup directory");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{MockStorage, StorageErrorKind};

    // ── split_frontmatter tests ──────────────────────────────────────

    #[test]
    fn test_split_simple() {
        let (yaml, body) = split_frontmatter("---\ntitle: IV\n---\n# Body\n").unwrap();
        assert_eq!(yaml, Some("title: IV\n"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_split_without_frontmatter() {
        let (yaml, body) = split_frontmatter("# Just a body\n").unwrap();
        assert!(yaml.is_none());
        assert_eq!(body, "# Just a body\n");
    }

    #[test]
    fn test_split_with_bom_and_dots_terminator() {
        let (yaml, body) = split_frontmatter("\u{feff}---\na: 1\n...\nrest").unwrap();
        assert_eq!(yaml, Some("a: 1\n"));
        assert_eq!(body, "rest");
    }

    #[test]
    fn test_split_empty_frontmatter() {
        let (yaml, body) = split_frontmatter("---\n---\nbody").unwrap();
        assert_eq!(yaml, Some(""));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_split_crlf_line_endings() {
        let (yaml, body) = split_frontmatter("---\r\ntitle: IV\r\n---\r\nbody").unwrap();
        assert_eq!(yaml, Some("title: IV\r\n"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_split_unterminated() {
        assert!(split_frontmatter("---\ntitle: IV\n# no closing fence\n").is_err());
    }

    // ── parse_frontmatter tests ──────────────────────────────────────

    #[test]
    fn test_parse_lists_and_numbers() {
        let map = parse_frontmatter("code:\n  - a.py\n  - a.R\nnumber: 3\n").unwrap();
        assert_eq!(map["code"], json!(["a.py", "a.R"]));
        assert_eq!(map["number"], json!(3));
    }

    #[test]
    fn test_parse_block_scalar() {
        let map = parse_frontmatter("summary: |\n  line one\n  line two\n").unwrap();
        assert_eq!(map["summary"], json!("line one\nline two\n"));
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        assert!(parse_frontmatter("- a\n- b\n").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_yaml() {
        assert!(parse_frontmatter("title: [unclosed").is_err());
    }

    // ── slug and directory tests ─────────────────────────────────────

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("sound-and-complete-iv"), "sound-and-complete-iv");
        assert_eq!(slugify("Parent AID"), "parent-aid");
        assert_eq!(slugify("a.b"), "ab");
    }

    #[test]
    fn test_frontmatter_slug_overrides_filename() {
        let file = parse_markup(
            Path::new("apps/Old Name.md"),
            "Old Name",
            "---\nslug: new-name\n---\n",
        )
        .unwrap();
        assert_eq!(file.slug, "new-name");
    }

    #[test]
    fn test_read_markup_directory() {
        let storage = MockStorage::new()
            .with_file("apps/frontdoor.md", "---\ntitle: Front-door\n---\nBody")
            .with_file("apps/iv.mdx", "---\ntitle: IV\n---\n<Code />")
            .with_file("apps/table.txt", "ignored");

        let files = read_markup_directory(
            &storage,
            Path::new("apps"),
            &ExtensionFilter::new([".md", ".mdx"]),
        )
        .unwrap();

        let slugs: Vec<_> = files.iter().map(|f| f.slug.as_str()).collect();
        assert_eq!(slugs, vec!["frontdoor", "iv"]);
        assert_eq!(files[0].frontmatter["title"], json!("Front-door"));
        assert_eq!(files[0].body, "Body");
        assert_eq!(files[1].body, "<Code />");
    }

    #[test]
    fn test_empty_slug_rejected() {
        let storage = MockStorage::new().with_file("apps/???.md", "---\ntitle: x\n---\n");

        let err = read_markup_directory(&storage, Path::new("apps"), &ExtensionFilter::new([".md"]))
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidFormat);
        assert!(err.to_string().contains("???.md"));
    }

    #[test]
    fn test_empty_slug_allowed_with_frontmatter_slug() {
        let file = parse_markup(Path::new("apps/???.md"), "???", "---\nslug: faq\n---\n").unwrap();
        assert_eq!(file.slug, "faq");
    }

    #[test]
    fn test_read_markup_directory_malformed_frontmatter() {
        let storage = MockStorage::new().with_file("apps/bad.md", "---\ntitle: x\n");

        let err = read_markup_directory(&storage, Path::new("apps"), &ExtensionFilter::new([".md"]))
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidFormat);
        assert!(err.to_string().contains("never closed"));
        assert!(err.to_string().contains("bad.md"));
    }
}
