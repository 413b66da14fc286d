//! Content module - reads posts and renders their markdown

mod error;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
mod store;

pub use error::ContentError;
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use loader::PostRepository;
pub use markdown::{MarkdownRenderer, DEFAULT_THEME};
pub use post::{Post, PostMeta};
pub use store::{build_tag_index, collect_tags, filter_by_tag, PostStore, TagIndex};
