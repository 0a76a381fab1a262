use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 元数据类型 - 对应三个筛选维度
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MetaKind {
    /// 分类
    Category,
    /// 标签
    Tag,
    /// 作者
    Author,
}

impl MetaKind {
    /// 按下拉框顺序排列的全部类型
    pub const ALL: [MetaKind; 3] = [MetaKind::Category, MetaKind::Tag, MetaKind::Author];

    /// slug 前缀
    pub fn prefix(self) -> &'static str {
        match self {
            MetaKind::Category => "category-",
            MetaKind::Tag => "tag-",
            MetaKind::Author => "author-",
        }
    }

    /// 下拉框的 CSS 类名
    pub fn class_name(self) -> &'static str {
        match self {
            MetaKind::Category => "category",
            MetaKind::Tag => "tag",
            MetaKind::Author => "author",
        }
    }
}

/// 元数据条目 - 唯一 slug 与展示名称
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MetaTerm {
    /// 带类型前缀的 slug，同时用作行标记
    pub slug: String,
    /// 展示名称
    pub name: String,
}

impl MetaTerm {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// 单篇文章的元数据
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PostMeta {
    #[serde(default)]
    pub categories: Vec<MetaTerm>,
    #[serde(default)]
    pub tags: Vec<MetaTerm>,
    /// 每篇文章恰好一位作者
    #[serde(default)]
    pub authors: Vec<MetaTerm>,
}

impl PostMeta {
    /// 获取指定类型的条目列表
    pub fn terms(&self, kind: MetaKind) -> &[MetaTerm] {
        match kind {
            MetaKind::Category => &self.categories,
            MetaKind::Tag => &self.tags,
            MetaKind::Author => &self.authors,
        }
    }

    /// 按 分类 -> 标签 -> 作者 的顺序遍历所有条目
    pub fn iter_terms(&self) -> impl Iterator<Item = (MetaKind, &MetaTerm)> {
        MetaKind::ALL
            .into_iter()
            .flat_map(move |kind| self.terms(kind).iter().map(move |term| (kind, term)))
    }
}

/// 查询结果: 文章ID(字符串) -> 元数据
pub type PostsMeta = BTreeMap<String, PostMeta>;

/// 查询接口的原始响应
///
/// 服务端以 PHP 数组编码结果：键不连续时得到 JSON 对象，
/// 结果为空（或键恰好为 0..n）时得到 JSON 数组，两种形式都需要接受。
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum LookupResponse {
    Map(BTreeMap<String, PostMeta>),
    List(Vec<Option<PostMeta>>),
}

impl LookupResponse {
    /// 统一转换为以文章ID为键的映射
    pub fn into_posts_meta(self) -> PostsMeta {
        match self {
            LookupResponse::Map(map) => map,
            LookupResponse::List(list) => list
                .into_iter()
                .enumerate()
                .filter_map(|(i, meta)| meta.map(|meta| (i.to_string(), meta)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_object_response() {
        let body = r#"{
            "12": {
                "categories": [{"slug": "category-news", "name": "News"}],
                "tags": [],
                "authors": [{"slug": "author-smith-1", "name": "Jane Smith"}]
            }
        }"#;
        let response: LookupResponse = serde_json::from_str(body).unwrap();
        let meta = response.into_posts_meta();

        assert_eq!(meta.len(), 1);
        let post = &meta["12"];
        assert_eq!(post.categories[0].slug, "category-news");
        assert_eq!(post.authors[0].name, "Jane Smith");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn empty_array_response_is_empty_map() {
        let response: LookupResponse = serde_json::from_str("[]").unwrap();
        assert!(response.into_posts_meta().is_empty());
    }

    #[test]
    fn list_response_keys_by_index() {
        let body = r#"[{"categories": [], "tags": [], "authors": []}, null]"#;
        let response: LookupResponse = serde_json::from_str(body).unwrap();
        let meta = response.into_posts_meta();

        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["0"]);
    }

    #[test]
    fn iter_terms_walks_kinds_in_order() {
        let post = PostMeta {
            categories: vec![MetaTerm::new("category-a", "A")],
            tags: vec![MetaTerm::new("tag-b", "B")],
            authors: vec![MetaTerm::new("author-c-3", "C")],
        };
        let kinds: Vec<MetaKind> = post.iter_terms().map(|(kind, _)| kind).collect();

        assert_eq!(kinds, MetaKind::ALL.to_vec());
    }
}
