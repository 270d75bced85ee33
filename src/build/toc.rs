//! Table of contents extraction.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::util::heading_anchor;

/// A second-level heading under a [`HeadingNode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocChild {
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
}

/// A top-level heading and the second-level headings that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    pub text: String,
    pub id: String,
    pub children: Vec<TocChild>,
}

/// Build a two-level outline from a markdown body.
///
/// `h1` opens an entry and `h2` attaches to the latest one; an `h2` before any
/// `h1` is left out, as is every other level. Parsing uses `options` so the
/// headings seen here are the headings the renderer sees.
pub fn build_toc(markdown: &str, options: pulldown_cmark::Options) -> Vec<HeadingNode> {
    let mut toc: Vec<HeadingNode> = Vec::new();
    let mut current: Option<(HeadingLevel, Option<String>)> = None;
    let mut text = String::new();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level, id.map(|id| id.to_string())));
                text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((level, explicit_id)) = current.take() else {
                    continue;
                };
                let text = text.trim().to_string();
                let id = heading_anchor(explicit_id.as_deref(), &text);
                match level {
                    HeadingLevel::H1 => toc.push(HeadingNode {
                        text,
                        id,
                        children: Vec::new(),
                    }),
                    HeadingLevel::H2 => {
                        if let Some(parent) = toc.last_mut() {
                            parent.children.push(TocChild { text, id });
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) | Event::Code(t) if current.is_some() => text.push_str(&t),
            _ => {}
        }
    }

    toc
}
