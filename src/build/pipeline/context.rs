//! Pipeline context for sharing state across stages.

use std::collections::HashMap;
use std::path::Path;

use crate::build::document::ContentCategory;
use crate::build::nav::SectionNav;
use crate::build::render::{Renderer, SiteContext};
use crate::config::MarkdownConfig;

/// Shared context for pipeline stages.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where output files are written
    pub output_dir: &'a Path,

    // === Site-level data ===
    pub site: &'a SiteContext,

    /// Markdown processing configuration
    pub markdown_config: &'a MarkdownConfig,

    // === Navigation ===
    /// Frozen navigation per section
    pub nav: &'a HashMap<ContentCategory, SectionNav>,

    // === Services ===
    pub renderer: &'a Renderer,

    // === Results ===
    /// Pages written so far
    pub pages_written: usize,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        output_dir: &'a Path,
        site: &'a SiteContext,
        markdown_config: &'a MarkdownConfig,
        nav: &'a HashMap<ContentCategory, SectionNav>,
        renderer: &'a Renderer,
    ) -> Self {
        Self {
            output_dir,
            site,
            markdown_config,
            nav,
            renderer,
            pages_written: 0,
        }
    }

    /// Navigation for a category's section; `Other` has none.
    pub fn nav_for(&self, category: ContentCategory) -> Option<&'a SectionNav> {
        self.nav.get(&category)
    }
}
