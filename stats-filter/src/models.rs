use std::collections::{BTreeMap, BTreeSet, HashSet};
use utils_common::{MetaKind, MetaTerm};

/// 下拉框中 "全部" 选项的值
pub const ALL_VALUE: &str = "all";

/// 单个下拉框的取值 - "全部" 或某个具体 slug
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice {
    #[default]
    All,
    Slug(String),
}

impl Choice {
    /// 从下拉框的 value 解析
    pub fn from_value(value: &str) -> Self {
        if value.is_empty() || value == ALL_VALUE {
            Choice::All
        } else {
            Choice::Slug(value.to_string())
        }
    }

    /// 转换为下拉框的 value
    pub fn as_value(&self) -> &str {
        match self {
            Choice::All => ALL_VALUE,
            Choice::Slug(slug) => slug,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }
}

/// 当前筛选条件 - 三个维度之间为逻辑与
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub category: Choice,
    pub tag: Choice,
    pub author: Choice,
}

impl FilterSelection {
    pub fn get(&self, kind: MetaKind) -> &Choice {
        match kind {
            MetaKind::Category => &self.category,
            MetaKind::Tag => &self.tag,
            MetaKind::Author => &self.author,
        }
    }

    pub fn set(&mut self, kind: MetaKind, choice: Choice) {
        match kind {
            MetaKind::Category => self.category = choice,
            MetaKind::Tag => self.tag = choice,
            MetaKind::Author => self.author = choice,
        }
    }

    /// 三个维度是否都为 "全部"
    pub fn is_all(&self) -> bool {
        self.category.is_all() && self.tag.is_all() && self.author.is_all()
    }
}

/// 可筛选的数据行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRow {
    /// 从统计链接提取的文章ID，缺少链接时为空
    pub post_id: Option<String>,
    /// 附加到行上的元数据 slug
    pub markers: BTreeSet<String>,
    /// 是否已附加元数据（未附加的行永远可见）
    pub tracked: bool,
    /// 是否被当前筛选条件选中
    pub selected: bool,
}

impl FilterRow {
    pub fn new(post_id: Option<String>) -> Self {
        Self {
            post_id,
            markers: BTreeSet::new(),
            tracked: false,
            selected: false,
        }
    }

    /// 行是否可见：未附加元数据的行不参与隐藏
    pub fn is_visible(&self) -> bool {
        !self.tracked || self.selected
    }

    pub fn has_marker(&self, slug: &str) -> bool {
        self.markers.contains(slug)
    }
}

/// 下拉框选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// 三类元数据的 slug -> 名称 映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaCatalog {
    categories: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    authors: BTreeMap<String, String>,
}

impl MetaCatalog {
    pub fn get(&self, kind: MetaKind) -> &BTreeMap<String, String> {
        match kind {
            MetaKind::Category => &self.categories,
            MetaKind::Tag => &self.tags,
            MetaKind::Author => &self.authors,
        }
    }

    fn get_mut(&mut self, kind: MetaKind) -> &mut BTreeMap<String, String> {
        match kind {
            MetaKind::Category => &mut self.categories,
            MetaKind::Tag => &mut self.tags,
            MetaKind::Author => &mut self.authors,
        }
    }

    /// 记录一个条目，同名 slug 后写覆盖先写
    pub fn insert(&mut self, kind: MetaKind, term: &MetaTerm) {
        self.get_mut(kind).insert(term.slug.clone(), term.name.clone());
    }

    /// 生成按 slug 升序排列的选项；给定 `present` 时只保留其中出现的 slug
    pub fn options(&self, kind: MetaKind, present: Option<&HashSet<&str>>) -> Vec<SelectOption> {
        self.get(kind)
            .iter()
            .filter(|(slug, _)| present.map_or(true, |present| present.contains(slug.as_str())))
            .map(|(slug, name)| SelectOption {
                value: slug.clone(),
                label: name.clone(),
            })
            .collect()
    }

    /// 某个 slug 是否属于任意一类元数据
    pub fn contains(&self, slug: &str) -> bool {
        MetaKind::ALL.iter().any(|&kind| self.get(kind).contains_key(slug))
    }

    pub fn len(&self) -> usize {
        self.categories.len() + self.tags.len() + self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 筛选器生命周期
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterState {
    /// 尚未找到统计表
    Uninitialized,
    /// 正在获取元数据，控件不可用
    Loading,
    /// 已就绪，所有维度为 "全部"
    Ready,
    /// 至少一个维度有具体选择
    Filtered,
    /// 初始化失败（终止状态）
    Error(String),
}

impl FilterState {
    pub fn name(&self) -> &'static str {
        match self {
            FilterState::Uninitialized => "uninitialized",
            FilterState::Loading => "loading",
            FilterState::Ready => "ready",
            FilterState::Filtered => "filtered",
            FilterState::Error(_) => "error",
        }
    }

    /// 控件是否可交互
    pub fn is_interactive(&self) -> bool {
        matches!(self, FilterState::Ready | FilterState::Filtered)
    }
}

/// 一次筛选计算的结果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// 被选中的可筛选行下标（文档顺序）
    pub selected_rows: Vec<usize>,
    /// 两个特殊行是否恢复显示
    pub special_rows_visible: bool,
    /// 因选项被剔除而回退为 "全部" 的维度
    pub reverted: Vec<MetaKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_round_trips_all() {
        assert_eq!(Choice::from_value("all"), Choice::All);
        assert_eq!(Choice::from_value(""), Choice::All);
        assert_eq!(Choice::from_value("tag-x").as_value(), "tag-x");
    }

    #[test]
    fn catalog_options_sorted_by_slug() {
        let mut catalog = MetaCatalog::default();
        catalog.insert(MetaKind::Tag, &MetaTerm::new("tag-zeta", "Alpha"));
        catalog.insert(MetaKind::Tag, &MetaTerm::new("tag-alpha", "Zeta"));

        let values: Vec<String> = catalog.options(MetaKind::Tag, None).into_iter().map(|o| o.value).collect();
        assert_eq!(values, vec!["tag-alpha", "tag-zeta"]);
    }

    #[test]
    fn catalog_last_write_wins() {
        let mut catalog = MetaCatalog::default();
        catalog.insert(MetaKind::Category, &MetaTerm::new("category-news", "News"));
        catalog.insert(MetaKind::Category, &MetaTerm::new("category-news", "Latest News"));

        assert_eq!(catalog.get(MetaKind::Category)["category-news"], "Latest News");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn untracked_row_always_visible() {
        let row = FilterRow::new(None);
        assert!(row.is_visible());
    }
}
