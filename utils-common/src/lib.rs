pub mod link;
pub mod models;
pub mod slug;

// 重新导出常用类型和函数，方便直接使用
pub use link::{lookup_url, post_id_from_href};
pub use models::{LookupResponse, MetaKind, MetaTerm, PostMeta, PostsMeta};
pub use slug::{author_slug, sanitize_last_name, term_slug, transliterate};
