//! Page template rendering stage.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::build::render::PageContext;

/// Stage that applies the category's detail template to rendered content.
///
/// Documents of a section see that section's navigation; other documents
/// see none. After this stage, `doc.output_html` contains the complete page.
pub struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let category = doc.item.category;
            let page_context = PageContext {
                site: ctx.site,
                page: &doc.item,
                content: std::mem::take(&mut doc.content),
                toc: doc.toc.clone(),
                nav: ctx.nav_for(category),
            };

            let html = ctx
                .renderer
                .render_page(category.detail_template(), &page_context)
                .map_err(|e| PipelineError::Render {
                    path: doc.item.source_path.clone(),
                    source: e,
                })?;

            doc.content = page_context.content;
            doc.output_html = Some(html);
        }
        Ok(())
    }
}
