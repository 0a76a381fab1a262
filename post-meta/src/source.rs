use serde::{Deserialize, Serialize};

/// 分类或标签（slug 不带类型前缀）
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub slug: String,
    pub name: String,
}

/// 文章作者
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Author {
    pub id: u64,
    pub display_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// 内容来源 - 提供文章的分类、标签与作者
pub trait ContentSource {
    fn post_exists(&self, post_id: u64) -> bool;

    fn categories(&self, post_id: u64) -> Vec<Term>;

    fn tags(&self, post_id: u64) -> Vec<Term>;

    /// 作者记录缺失时返回 `None`
    fn author_of(&self, post_id: u64) -> Option<Author>;
}
