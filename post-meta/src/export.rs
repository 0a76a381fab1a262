use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::MetaError;
use crate::source::{Author, ContentSource, Term};

/// 导出文件中的一篇文章
#[derive(Deserialize, Debug, Clone)]
struct ExportPost {
    id: u64,
    #[serde(default)]
    categories: Vec<Term>,
    #[serde(default)]
    tags: Vec<Term>,
    /// 作者ID
    author: u64,
}

#[derive(Deserialize, Debug)]
struct RawExport {
    posts: Vec<ExportPost>,
    #[serde(default)]
    authors: Vec<Author>,
}

/// 以 JSON 内容导出文件为来源
///
/// ```json
/// { "posts":   [{ "id": 12, "categories": [{"slug": "news", "name": "News"}], "tags": [], "author": 1 }],
///   "authors": [{ "id": 1, "display_name": "Jane Smith", "last_name": "Smith" }] }
/// ```
#[derive(Debug, Clone)]
pub struct ContentExport {
    posts: HashMap<u64, ExportPost>,
    authors: HashMap<u64, Author>,
}

impl ContentExport {
    /// 从文件加载
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MetaError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| MetaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// 从 JSON 文本解析
    pub fn from_json(json: &str) -> Result<Self, MetaError> {
        let raw: RawExport = serde_json::from_str(json)?;

        let mut posts = HashMap::with_capacity(raw.posts.len());
        for post in raw.posts {
            if post.id == 0 {
                return Err(MetaError::Invalid("post id 0 is not allowed".to_string()));
            }
            let id = post.id;
            if posts.insert(id, post).is_some() {
                return Err(MetaError::Invalid(format!("duplicate post id {}", id)));
            }
        }

        let authors = raw.authors.into_iter().map(|author| (author.id, author)).collect();

        Ok(Self { posts, authors })
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

impl ContentSource for ContentExport {
    fn post_exists(&self, post_id: u64) -> bool {
        self.posts.contains_key(&post_id)
    }

    fn categories(&self, post_id: u64) -> Vec<Term> {
        self.posts.get(&post_id).map(|post| post.categories.clone()).unwrap_or_default()
    }

    fn tags(&self, post_id: u64) -> Vec<Term> {
        self.posts.get(&post_id).map(|post| post.tags.clone()).unwrap_or_default()
    }

    fn author_of(&self, post_id: u64) -> Option<Author> {
        let author_id = self.posts.get(&post_id)?.author;
        // 作者记录缺失时名称为空，与内容系统的行为一致
        Some(self.authors.get(&author_id).cloned().unwrap_or(Author {
            id: author_id,
            ..Author::default()
        }))
    }
}
