use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Title used when a document has none.
pub const UNTITLED: &str = "Untitled";

/// Group used when a document has none.
pub const UNGROUPED: &str = "Ungrouped";

// =============================================================================
// Content categories
// =============================================================================

/// The section a document belongs to, fixed at discovery time.
///
/// Template choice and navigation context hang off this tag instead of being
/// re-derived from path text on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    About,
    Projects,
    Research,
    Blog,
    Other,
}

impl ContentCategory {
    /// The sections that get a listing page, in build order.
    pub const SECTIONS: [ContentCategory; 4] = [
        ContentCategory::About,
        ContentCategory::Projects,
        ContentCategory::Research,
        ContentCategory::Blog,
    ];

    /// Classify a section directory name.
    pub fn from_section(section: &str) -> Self {
        match section {
            "about" => ContentCategory::About,
            "projects" => ContentCategory::Projects,
            "research" => ContentCategory::Research,
            "blog" => ContentCategory::Blog,
            _ => ContentCategory::Other,
        }
    }

    /// The section directory name. `Other` has no directory of its own.
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            ContentCategory::About => Some("about"),
            ContentCategory::Projects => Some("projects"),
            ContentCategory::Research => Some("research"),
            ContentCategory::Blog => Some("blog"),
            ContentCategory::Other => None,
        }
    }

    /// Whether this section is ordered by date instead of by `order`.
    pub fn is_chronological(&self) -> bool {
        matches!(self, ContentCategory::Blog)
    }

    /// Template for a single document page.
    pub fn detail_template(&self) -> &'static str {
        match self {
            ContentCategory::About => "about.html",
            ContentCategory::Projects => "project-detail.html",
            ContentCategory::Research => "research-detail.html",
            ContentCategory::Blog => "blog-detail.html",
            ContentCategory::Other => "base.html",
        }
    }

    /// Template for the section listing page.
    pub fn index_template(&self) -> Option<&'static str> {
        match self {
            ContentCategory::About => Some("about-index.html"),
            ContentCategory::Projects => Some("projects.html"),
            ContentCategory::Research => Some("research.html"),
            ContentCategory::Blog => Some("blog.html"),
            ContentCategory::Other => None,
        }
    }

    /// Value of `currentPage` in templates, used to highlight the menu entry.
    pub fn current_page(&self) -> &'static str {
        match self {
            ContentCategory::Projects => "projects",
            ContentCategory::Research => "research",
            ContentCategory::Blog => "blog",
            ContentCategory::About | ContentCategory::Other => "about",
        }
    }

    /// Template variable holding the section's ordered item list.
    pub fn items_key(&self) -> &'static str {
        match self {
            ContentCategory::About => "about",
            ContentCategory::Projects => "projects",
            ContentCategory::Research => "research",
            ContentCategory::Blog => "blog",
            ContentCategory::Other => "items",
        }
    }

    /// Template variable holding the section's groups.
    pub fn groups_key(&self) -> &'static str {
        match self {
            ContentCategory::About => "aboutGroups",
            ContentCategory::Projects => "projectGroups",
            ContentCategory::Research => "researchGroups",
            ContentCategory::Blog => "blogGroups",
            ContentCategory::Other => "groups",
        }
    }

    /// Template variable holding the month buckets of the chronological section.
    pub fn buckets_key(&self) -> Option<&'static str> {
        match self {
            ContentCategory::Blog => Some("blogByMonth"),
            _ => None,
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name().unwrap_or("other"))
    }
}

// =============================================================================
// Front matter
// =============================================================================

/// Front matter metadata parsed from the document, kept as raw YAML values.
///
/// Normalized fields are read through [`FrontMatter::resolve`]; everything is
/// also handed to templates as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// A field as text, if it is a non-empty scalar.
    pub fn text(&self, key: &str) -> Option<String> {
        let text = match self.fields.get(key)? {
            serde_yaml::Value::String(s) => s.trim().to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Tagged(tagged) => match &tagged.value {
                serde_yaml::Value::String(s) => s.trim().to_string(),
                _ => return None,
            },
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// First non-empty field among `keys`, in priority order.
    pub fn resolve(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// A field as a number. Numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            serde_yaml::Value::Number(n) => n.as_f64(),
            serde_yaml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("front matter block opened with '---' is never closed")]
    Unterminated,

    #[error("invalid front matter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of field names to values")]
    NotAMapping,
}

/// Result of parsing front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` at the start of the file:
///
/// ```markdown
/// ---
/// title: My Page
/// date: 2024-03-01
/// group: Systems
/// ---
///
/// # Content starts here
/// ```
///
/// A file without an opening delimiter has no front matter.
pub fn parse_front_matter(content: &str) -> Result<ParsedContent, FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let trimmed = content.trim_start();

    let Some(after_opening) = trimmed.strip_prefix("---") else {
        return Ok(ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        });
    };

    // The opening delimiter must be alone on its line
    let Some(after_opening) = after_opening
        .strip_prefix("\r\n")
        .or_else(|| after_opening.strip_prefix('\n'))
    else {
        return Ok(ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        });
    };

    // Closing delimiter: a line starting with "---"
    let (yaml_content, rest) = if after_opening.starts_with("---") {
        ("", &after_opening[3..])
    } else {
        let closing_pos = after_opening
            .find("\n---")
            .ok_or(FrontMatterError::Unterminated)?;
        (&after_opening[..closing_pos], &after_opening[closing_pos + 4..])
    };

    // Drop the remainder of the closing delimiter line
    let markdown_content = match rest.find('\n') {
        Some(pos) => rest[pos + 1..].trim_start_matches(['\r', '\n']).to_string(),
        None => String::new(),
    };

    let front_matter = if yaml_content.trim().is_empty() {
        FrontMatter::default()
    } else {
        match serde_yaml::from_str::<serde_yaml::Value>(yaml_content)? {
            serde_yaml::Value::Null => FrontMatter::default(),
            value @ serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)?,
            _ => return Err(FrontMatterError::NotAMapping),
        }
    };

    Ok(ParsedContent {
        front_matter,
        content: markdown_content,
    })
}

/// Parse a front matter date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and naive `YYYY-MM-DDTHH:MM[:SS]`
/// or `YYYY-MM-DD HH:MM[:SS]` date-times. Only the calendar date is kept.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    .map(|datetime| datetime.date())
}

// =============================================================================
// Content items
// =============================================================================

/// One content document with its metadata normalized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// File stem of the source document
    pub slug: String,
    pub category: ContentCategory,
    /// First directory under the content root (empty for root-level documents)
    pub section: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub group: String,
    pub thumbnail: String,
    pub summary: String,
    pub order: Option<f64>,
    /// Output location relative to the output root, always `/`-separated
    pub output_path: String,
    /// All front matter fields, untouched
    pub front_matter: FrontMatter,
    /// Path relative to the content root
    #[serde(skip)]
    pub source_path: PathBuf,
    /// Markdown body without the front matter block
    #[serde(skip)]
    pub body: String,
    /// The `date` field when present but not a recognizable date
    #[serde(skip)]
    pub unparsed_date: Option<String>,
}

impl ContentItem {
    /// Build an item from a parsed document.
    ///
    /// `source_path` is relative to the content root; `extension` is the
    /// output page extension.
    pub fn from_parsed(source_path: &Path, parsed: ParsedContent, extension: &str) -> Self {
        let ParsedContent {
            front_matter,
            content,
        } = parsed;

        let slug = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let section = match source_path.components().count() {
            0 | 1 => String::new(),
            _ => source_path
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .unwrap_or_default(),
        };
        let category = ContentCategory::from_section(&section);

        let raw_date = front_matter.text("date");
        let date = raw_date.as_deref().and_then(parse_date);
        let unparsed_date = raw_date.filter(|_| date.is_none());

        let output_path = front_matter
            .resolve(&["filename"])
            .map(|filename| filename.trim_start_matches('/').to_string())
            .unwrap_or_else(|| default_output_path(source_path, extension));

        Self {
            title: front_matter
                .resolve(&["title"])
                .unwrap_or_else(|| UNTITLED.to_string()),
            group: front_matter
                .resolve(&["group"])
                .unwrap_or_else(|| UNGROUPED.to_string()),
            thumbnail: front_matter
                .resolve(&["thumbnail", "card_img"])
                .unwrap_or_default(),
            summary: front_matter
                .resolve(&["summary", "description", "excerpt"])
                .unwrap_or_default(),
            order: front_matter.number("order"),
            slug,
            category,
            section,
            date,
            output_path,
            front_matter,
            source_path: source_path.to_path_buf(),
            body: content,
            unparsed_date,
        }
    }

    /// Whether the document sits directly inside its section directory.
    pub fn is_section_entry(&self) -> bool {
        self.category != ContentCategory::Other && self.source_path.components().count() == 2
    }
}

/// The source path with its extension swapped, as a `/`-separated string.
/// "blog/first-post.md" -> "blog/first-post.html"
pub fn default_output_path(source_path: &Path, extension: &str) -> String {
    source_path
        .with_extension(extension.trim_start_matches('.'))
        .to_string_lossy()
        .replace('\\', "/")
}
