use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use tera::{Context, Tera, Value};
use walkdir::WalkDir;

use super::document::{ContentCategory, ContentItem, parse_date};
use super::nav::SectionNav;
use super::paths::is_hidden;
use super::toc::HeadingNode;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("templates directory not found: {0}")]
    TemplatesNotFound(PathBuf),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("failed to read template directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load every template under `templates_dir`, plus every file under each
    /// include directory (named by its path relative to that directory).
    ///
    /// Hidden files and files that are not UTF-8 text are left out, so icons
    /// can sit next to photos. Missing include directories are skipped.
    pub fn new(templates_dir: &Path, include_dirs: &[PathBuf]) -> Result<Self, RenderError> {
        if !templates_dir.is_dir() {
            return Err(RenderError::TemplatesNotFound(templates_dir.to_path_buf()));
        }

        let mut templates = template_sources(templates_dir)?;
        tracing::debug!(path = %templates_dir.display(), count = templates.len(), "loaded templates");

        for include_dir in include_dirs {
            if !include_dir.is_dir() {
                tracing::debug!(path = %include_dir.display(), "include directory not found, skipping");
                continue;
            }
            let files = template_sources(include_dir)?;
            tracing::debug!(path = %include_dir.display(), count = files.len(), "registered include files");
            templates.extend(files);
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)?;
        tera.register_filter("date", date_filter);

        Ok(Self { tera })
    }

    /// Render a document page.
    pub fn render_page(&self, template: &str, context: &PageContext) -> Result<String, RenderError> {
        let mut tera_context = Context::new();

        // Front matter first so the fields below win on name clashes
        for (key, value) in &context.page.front_matter.fields {
            tera_context.insert(key.as_str(), value);
        }
        if let Some(nav) = context.nav {
            nav.insert_into(&mut tera_context);
        }

        tera_context.insert("site", context.site);
        tera_context.insert("page", context.page);
        tera_context.insert("content", &context.content);
        tera_context.insert("title", &context.page.title);
        tera_context.insert("toc", &context.toc);
        tera_context.insert("currentPage", context.page.category.current_page());
        tera_context.insert("currentSlug", &context.page.slug);

        self.render(template, &tera_context)
    }

    /// Render a section listing page.
    pub fn render_listing(
        &self,
        template: &str,
        context: &ListingContext,
    ) -> Result<String, RenderError> {
        let mut tera_context = Context::new();
        context.nav.insert_into(&mut tera_context);
        tera_context.insert("site", context.site);
        tera_context.insert("currentPage", context.category().current_page());

        self.render(template, &tera_context)
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, RenderError> {
        if !self.has_template(template) {
            return Err(RenderError::TemplateNotFound(template.to_string()));
        }
        Ok(self.tera.render(template, context)?)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

/// Text files under `dir`, named by their `/`-separated relative path.
fn template_sources(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    let mut sources = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| RenderError::Walk {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let bytes = std::fs::read(entry.path()).map_err(|e| RenderError::Read {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        let Ok(text) = String::from_utf8(bytes) else {
            tracing::debug!(path = %entry.path().display(), "not a text file, skipping");
            continue;
        };

        let name = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        sources.push((name, text));
    }
    Ok(sources)
}

// =============================================================================
// Filters
// =============================================================================

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// `{{ value | date }}` or `{{ value | date(format="%d %B %Y") }}`.
///
/// Accepts the date strings front matter accepts, plus unix timestamps.
/// Empty and null values render as an empty string.
fn date_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let datetime = match value {
        Value::Null => return Ok(Value::String(String::new())),
        Value::String(s) if s.trim().is_empty() => return Ok(Value::String(String::new())),
        Value::String(s) => parse_datetime(s)
            .ok_or_else(|| tera::Error::msg(format!("date filter: cannot parse '{s}' as a date")))?,
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| tera::Error::msg(format!("date filter: invalid timestamp {n}")))?,
        other => {
            return Err(tera::Error::msg(format!(
                "date filter: expected a string or a timestamp, got {other}"
            )));
        }
    };

    let format = match args.get("format") {
        Some(Value::String(format)) => format.as_str(),
        Some(other) => {
            return Err(tera::Error::msg(format!(
                "date filter: `format` must be a string, got {other}"
            )));
        }
        None => DEFAULT_DATE_FORMAT,
    };

    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(tera::Error::msg(format!(
            "date filter: invalid format '{format}'"
        )));
    }

    // Writing rather than to_string: specifiers a naive value cannot fill
    // (e.g. %z) come back as an error instead of a panic
    let mut out = String::new();
    write!(out, "{}", datetime.format_with_items(items.into_iter())).map_err(|_| {
        tera::Error::msg(format!("date filter: format '{format}' needs a time zone"))
    })?;

    Ok(Value::String(out))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| parse_date(value).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

// =============================================================================
// Template contexts
// =============================================================================

/// Site-level information, `site.*` in templates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteContext {
    pub name: String,
    pub url: Option<String>,
    /// Free-form values from the config file
    pub params: serde_json::Value,
}

/// Context for a document page.
#[derive(Debug)]
pub struct PageContext<'a> {
    pub site: &'a SiteContext,
    pub page: &'a ContentItem,
    /// Rendered HTML body
    pub content: String,
    pub toc: Vec<HeadingNode>,
    /// Navigation of the document's own section, if it has one
    pub nav: Option<&'a SectionNav>,
}

/// Context for a section listing page.
#[derive(Debug)]
pub struct ListingContext<'a> {
    pub site: &'a SiteContext,
    pub nav: &'a SectionNav,
}

impl ListingContext<'_> {
    pub fn category(&self) -> ContentCategory {
        self.nav.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::parse_front_matter;
    use crate::config::MissingDatePolicy;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn doc(path: &str, raw: &str) -> ContentItem {
        ContentItem::from_parsed(Path::new(path), parse_front_matter(raw).unwrap(), "html")
    }

    fn renderer_with(templates: &[(&str, &str)]) -> (tempfile::TempDir, Renderer) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in templates {
            write(&dir.path().join("templates"), name, body);
        }
        let renderer = Renderer::new(&dir.path().join("templates"), &[]).unwrap();
        (dir, renderer)
    }

    fn render_filter(value: Value, format: Option<&str>) -> tera::Result<Value> {
        let mut args = HashMap::new();
        if let Some(format) = format {
            args.insert("format".to_string(), Value::String(format.to_string()));
        }
        date_filter(&value, &args)
    }

    #[test]
    fn test_missing_templates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = Renderer::new(&dir.path().join("templates"), &[]);
        assert!(matches!(result, Err(RenderError::TemplatesNotFound(_))));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let (_dir, renderer) = renderer_with(&[("base.html", "{{ content }}")]);
        let site = SiteContext::default();
        let page = doc("talks/a.md", "");
        let context = PageContext {
            site: &site,
            page: &page,
            content: String::new(),
            toc: Vec::new(),
            nav: None,
        };

        let err = renderer.render_page("missing.html", &context).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(name) if name == "missing.html"));
    }

    #[test]
    fn test_page_context_variables() {
        let (_dir, renderer) = renderer_with(&[(
            "blog-detail.html",
            "{{ title }}|{{ author }}|{{ currentPage }}|{{ currentSlug }}|{{ site.name }}|{{ page.group }}|{{ content }}|{% for g in blogByMonth %}{{ g.key }};{% endfor %}",
        )]);
        let site = SiteContext {
            name: "Jane".to_string(),
            ..Default::default()
        };
        let page = doc(
            "blog/post.md",
            "---\ntitle: Post\nauthor: Jane Doe\ndate: 2024-03-01\ncontent: ignored\n---\n",
        );
        let nav = SectionNav::build(
            ContentCategory::Blog,
            vec![page.clone()],
            MissingDatePolicy::Earliest,
        );
        let context = PageContext {
            site: &site,
            page: &page,
            content: "<p>Body & more</p>".to_string(),
            toc: Vec::new(),
            nav: Some(&nav),
        };

        let html = renderer.render_page("blog-detail.html", &context).unwrap();
        // Autoescape is off, front matter cannot shadow the rendered body
        assert_eq!(
            html,
            "Post|Jane Doe|blog|post|Jane|Ungrouped|<p>Body & more</p>|March 2024;"
        );
    }

    #[test]
    fn test_untitled_page() {
        let (_dir, renderer) = renderer_with(&[("base.html", "<title>{{ title }}</title>")]);
        let site = SiteContext::default();
        let page = doc("colophon.md", "no front matter");
        let context = PageContext {
            site: &site,
            page: &page,
            content: String::new(),
            toc: Vec::new(),
            nav: None,
        };

        let html = renderer.render_page("base.html", &context).unwrap();
        assert_eq!(html, "<title>Untitled</title>");
    }

    #[test]
    fn test_listing_context() {
        let (_dir, renderer) = renderer_with(&[(
            "projects.html",
            "{{ currentPage }}:{% for g in projectGroups %}[{{ g.key }}{% for p in g.items %} {{ p.slug }}{% endfor %}]{% endfor %}:{{ projects | length }}",
        )]);
        let site = SiteContext::default();
        let nav = SectionNav::build(
            ContentCategory::Projects,
            vec![
                doc("projects/b.md", "---\ngroup: Tools\norder: 2\n---\n"),
                doc("projects/a.md", "---\ngroup: Tools\norder: 1\n---\n"),
                doc("projects/c.md", "---\ngroup: Apps\n---\n"),
            ],
            MissingDatePolicy::Earliest,
        );
        let context = ListingContext {
            site: &site,
            nav: &nav,
        };

        let html = renderer.render_listing("projects.html", &context).unwrap();
        assert_eq!(html, "projects:[Apps c][Tools a b]:3");
        assert_eq!(context.category(), ContentCategory::Projects);
    }

    #[test]
    fn test_include_dirs_are_registered_by_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "templates/base.html", "{% include \"icons/star.svg\" %}");
        write(dir.path(), "assets/icons/star.svg", "<svg>*</svg>");

        let renderer = Renderer::new(
            &dir.path().join("templates"),
            &[dir.path().join("assets"), dir.path().join("missing")],
        )
        .unwrap();
        assert!(renderer.has_template("icons/star.svg"));

        let site = SiteContext::default();
        let page = doc("colophon.md", "");
        let context = PageContext {
            site: &site,
            page: &page,
            content: String::new(),
            toc: Vec::new(),
            nav: None,
        };
        assert_eq!(renderer.render_page("base.html", &context).unwrap(), "<svg>*</svg>");
    }

    #[test]
    fn test_binary_and_hidden_files_are_not_templates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "templates/base.html", "{% include \"icon.svg\" %}");
        write(dir.path(), "templates/.DS_Store", "{% broken");
        write(dir.path(), "assets/icon.svg", "<svg/>");
        write(dir.path(), "assets/.hidden/draft.svg", "{{ broken");
        let photo = dir.path().join("assets/photo.png");
        std::fs::write(&photo, [0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00]).unwrap();

        let renderer =
            Renderer::new(&dir.path().join("templates"), &[dir.path().join("assets")]).unwrap();
        assert!(renderer.has_template("base.html"));
        assert!(renderer.has_template("icon.svg"));
        assert!(!renderer.has_template("photo.png"));
        assert!(!renderer.has_template(".DS_Store"));
        assert!(!renderer.has_template(".hidden/draft.svg"));
    }

    #[test]
    fn test_date_filter_formats() {
        assert_eq!(
            render_filter(Value::String("2024-03-01".into()), None).unwrap(),
            Value::String("2024-03-01".into())
        );
        assert_eq!(
            render_filter(Value::String("2024-03-01".into()), Some("%d %B %Y")).unwrap(),
            Value::String("01 March 2024".into())
        );
        assert_eq!(
            render_filter(Value::String("2024-03-01T14:30:00Z".into()), Some("%H:%M")).unwrap(),
            Value::String("14:30".into())
        );
        assert_eq!(
            render_filter(Value::from(0), None).unwrap(),
            Value::String("1970-01-01".into())
        );
    }

    #[test]
    fn test_date_filter_empty_values() {
        assert_eq!(render_filter(Value::Null, None).unwrap(), Value::String(String::new()));
        assert_eq!(
            render_filter(Value::String("  ".into()), None).unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_date_filter_errors() {
        assert!(render_filter(Value::String("someday".into()), None).is_err());
        assert!(render_filter(Value::String("2024-03-01".into()), Some("%Q")).is_err());
        assert!(render_filter(Value::String("2024-03-01".into()), Some("%z")).is_err());
        assert!(render_filter(Value::Bool(true), None).is_err());
    }

    #[test]
    fn test_date_filter_in_template() {
        let (_dir, renderer) = renderer_with(&[(
            "base.html",
            "{{ page.date | date(format=\"%B %-d, %Y\") }}|{{ missing | default(value=\"\") | date }}",
        )]);
        let site = SiteContext::default();
        let page = doc("notes/a.md", "---\ndate: 2024-01-15\n---\n");
        let context = PageContext {
            site: &site,
            page: &page,
            content: String::new(),
            toc: Vec::new(),
            nav: None,
        };
        assert_eq!(
            renderer.render_page("base.html", &context).unwrap(),
            "January 15, 2024|"
        );
    }
}
