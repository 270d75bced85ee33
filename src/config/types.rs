use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root configuration
// =============================================================================

/// Site configuration, read from `folio.yaml`.
///
/// Every section is optional; a missing file builds `src/` into `dist/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub dates: DateConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    pub url: Option<String>,
    /// Arbitrary values passed to templates as `site.params.*`
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_site_name() -> String {
    "Personal Site".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: None,
            params: serde_json::Value::Null,
        }
    }
}

// =============================================================================
// Build layout
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Source root (relative to the config file)
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Output directory (relative to the config file); wiped on every build
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Content root, relative to `source`
    #[serde(default = "default_content")]
    pub content: PathBuf,
    /// Template directory, relative to `source`
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    /// Extra template lookup directories (e.g. inline SVG icons), relative to `source`
    #[serde(default = "default_include")]
    pub include: Vec<PathBuf>,
    /// Asset directories copied verbatim, relative to `source`
    #[serde(default = "default_static", rename = "static")]
    pub static_dirs: Vec<PathBuf>,
    /// Rendered page (relative to `output`) copied to `index.html`
    #[serde(default = "default_root_page")]
    pub root_page: PathBuf,
    /// Extension of rendered pages
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_content() -> PathBuf {
    PathBuf::from("content")
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_include() -> Vec<PathBuf> {
    vec![PathBuf::from("img/assets")]
}

fn default_static() -> Vec<PathBuf> {
    vec![
        PathBuf::from("css"),
        PathBuf::from("js"),
        PathBuf::from("img"),
    ]
}

fn default_root_page() -> PathBuf {
    PathBuf::from("about/about.html")
}

fn default_extension() -> String {
    "html".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            content: default_content(),
            templates: default_templates(),
            include: default_include(),
            static_dirs: default_static(),
            root_page: default_root_page(),
            extension: default_extension(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

/// Markdown options, passed explicitly to every render call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
    /// Render single newlines inside a paragraph as `<br />`
    #[serde(default = "default_hard_breaks")]
    pub hard_breaks: bool,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "gfm".to_string(),
        "tables".to_string(),
        "footnotes".to_string(),
        "strikethrough".to_string(),
        "tasklists".to_string(),
    ]
}

fn default_hard_breaks() -> bool {
    true
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            hard_breaks: default_hard_breaks(),
        }
    }
}

// =============================================================================
// Date handling
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateConfig {
    /// Where undated (or unparsable) posts land in the chronological section
    #[serde(default)]
    pub missing: MissingDatePolicy,
}

/// Sort position for documents without a usable date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDatePolicy {
    /// Treat as the earliest representable date (last in a newest-first list)
    #[default]
    Earliest,
    /// Treat as the latest representable date (first in a newest-first list)
    Latest,
}
