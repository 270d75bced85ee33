//! Default pipeline stages.
//!
//! 1. **MathStage** - Wrap `$$…$$` regions for the client-side typesetter
//! 2. **TocStage** - Extract the two-level heading outline
//! 3. **MarkdownStage** - Convert markdown to HTML with heading anchors
//! 4. **TemplateStage** - Wrap content in the category template
//! 5. **WriteStage** - Write final HTML to the output directory
//!
//! **PublishRootStage** runs once at the end and publishes the site root page.

mod markdown;
mod math;
mod publish;
mod template;
mod toc;
mod write;

pub use markdown::MarkdownStage;
pub use math::MathStage;
pub use publish::PublishRootStage;
pub use template::TemplateStage;
pub use toc::TocStage;
pub use write::WriteStage;
