// 导出模块
pub mod builder;
pub mod error;
pub mod export;
pub mod source;

pub use builder::{metadata_for_posts, parse_post_id};
pub use error::MetaError;
pub use export::ContentExport;
pub use source::{Author, ContentSource, Term};
