//! Markdown rendering with heading anchors and math-block preprocessing.

use std::sync::OnceLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use regex::{Captures, Regex};

use crate::config::MarkdownConfig;
use crate::util::heading_anchor;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Parser options for the configured extensions.
///
/// Shared by the renderer and the table of contents so both parse the same
/// document.
pub fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

fn math_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `[^$]` also matches newlines, so blocks may span lines
    RE.get_or_init(|| Regex::new(r"\$\$([^$]+)\$\$").expect("valid math block regex"))
}

/// Wrap every `$$…$$` region in a block-level container.
///
/// The markdown renderer passes the container through untouched, so the math
/// reaches the browser-side typesetter verbatim. Nothing outside the
/// delimiters changes.
pub fn preprocess_math_blocks(markdown: &str) -> String {
    math_block_regex()
        .replace_all(markdown, |caps: &Captures| {
            format!("\n<div class=\"math\">$${}$$</div>\n", &caps[1])
        })
        .into_owned()
}

/// Heading being buffered until its text (and therefore its id) is known.
struct PendingHeading<'a> {
    level: pulldown_cmark::HeadingLevel,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    text: String,
    inner: Vec<Event<'a>>,
}

impl PendingHeading<'_> {
    fn open_tag(&self, id: &str) -> String {
        let class_attr = if self.classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", self.classes.join(" "))
        };
        let extra_attrs = self
            .attrs
            .iter()
            .map(|(k, v)| match v {
                Some(val) => format!(" {}=\"{}\"", k, val),
                None => format!(" {}", k),
            })
            .collect::<String>();

        format!("<{} id=\"{}\"{}{}>", self.level, id, class_attr, extra_attrs)
    }
}

/// Render markdown to HTML using pulldown-cmark.
///
/// Every heading gets an `id` from [`heading_anchor`], matching the ids the
/// table of contents links to.
pub fn render_markdown(
    markdown: &str,
    markdown_config: &MarkdownConfig,
) -> Result<String, MarkdownError> {
    let options = parser_options(markdown_config)?;
    let parser = Parser::new_ext(markdown, options);

    let mut heading: Option<PendingHeading> = None;

    let events: Vec<Event> = parser
        .flat_map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                heading = Some(PendingHeading {
                    level,
                    id: id.map(|id| id.to_string()),
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.as_ref().map(|v| v.to_string())))
                        .collect(),
                    text: String::new(),
                    inner: Vec::new(),
                });
                vec![]
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some(pending) = heading.take() else {
                    return vec![];
                };
                let id = heading_anchor(pending.id.as_deref(), pending.text.trim());

                let mut out = Vec::with_capacity(pending.inner.len() + 2);
                out.push(Event::Html(pending.open_tag(&id).into()));
                out.extend(pending.inner);
                out.push(Event::Html(format!("</{}>\n", pending.level).into()));
                out
            }
            event if heading.is_some() => {
                if let Some(pending) = heading.as_mut() {
                    if let Event::Text(t) | Event::Code(t) = &event {
                        pending.text.push_str(t);
                    }
                    let event = match event {
                        Event::SoftBreak if markdown_config.hard_breaks => Event::HardBreak,
                        other => other,
                    };
                    pending.inner.push(event);
                }
                vec![]
            }
            Event::SoftBreak if markdown_config.hard_breaks => vec![Event::HardBreak],
            _ => vec![event],
        })
        .collect();

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    Ok(html_output)
}
