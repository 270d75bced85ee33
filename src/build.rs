mod builder;
mod document;
mod markdown;
mod nav;
mod paths;
pub mod pipeline;
mod render;
pub mod source;
mod toc;

pub use builder::Builder;
