use std::collections::{BTreeMap, HashSet};
use utils_common::{MetaKind, PostsMeta};

use crate::error::FilterError;
use crate::models::{Choice, FilterOutcome, FilterRow, FilterSelection, FilterState, MetaCatalog, SelectOption};

/// 行筛选引擎
///
/// 持有可筛选行、元数据映射与当前筛选条件，不依赖页面 DOM。
/// 页面层在每次计算之后根据引擎状态同步行的类名与下拉框选项。
#[derive(Debug, Clone)]
pub struct FilterEngine {
    rows: Vec<FilterRow>,
    catalog: MetaCatalog,
    selection: FilterSelection,
    offered: BTreeMap<MetaKind, Vec<SelectOption>>,
    special_rows_visible: bool,
    state: FilterState,
}

impl FilterEngine {
    /// 按文档顺序传入每个可筛选行的文章ID（缺少统计链接的行为 `None`）
    pub fn new(post_ids: Vec<Option<String>>) -> Self {
        Self {
            rows: post_ids.into_iter().map(FilterRow::new).collect(),
            catalog: MetaCatalog::default(),
            selection: FilterSelection::default(),
            offered: MetaKind::ALL.into_iter().map(|kind| (kind, Vec::new())).collect(),
            special_rows_visible: true,
            state: FilterState::Uninitialized,
        }
    }

    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    pub fn catalog(&self) -> &MetaCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn special_rows_visible(&self) -> bool {
        self.special_rows_visible
    }

    /// 当前下拉框中提供的具体选项（不含 "全部"）
    pub fn options(&self, kind: MetaKind) -> &[SelectOption] {
        self.offered.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 需要查询元数据的文章ID，保持文档顺序
    pub fn post_ids(&self) -> Vec<String> {
        self.rows.iter().filter_map(|row| row.post_id.clone()).collect()
    }

    /// 当前可见的可筛选行下标
    pub fn visible_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_visible())
            .map(|(i, _)| i)
            .collect()
    }

    /// 进入加载状态，控件保持不可用
    pub fn begin_loading(&mut self) -> Result<(), FilterError> {
        match self.state {
            FilterState::Uninitialized => {
                self.state = FilterState::Loading;
                Ok(())
            }
            _ => Err(self.invalid("begin_loading")),
        }
    }

    /// 初始化失败，进入终止状态
    pub fn fail(&mut self, error: &FilterError) -> Result<(), FilterError> {
        match self.state {
            FilterState::Uninitialized | FilterState::Loading => {
                self.state = FilterState::Error(error.to_string());
                Ok(())
            }
            _ => Err(self.invalid("fail")),
        }
    }

    /// 根据查询结果附加元数据并生成完整的选项列表
    ///
    /// 返回附加了元数据的行数。没有元数据的行不带任何标记，始终可见。
    pub fn init_filter(&mut self, posts_meta: &PostsMeta) -> Result<usize, FilterError> {
        if self.state != FilterState::Loading {
            return Err(self.invalid("init_filter"));
        }

        let mut tracked = 0;
        for row in &mut self.rows {
            let Some(meta) = row.post_id.as_ref().and_then(|id| posts_meta.get(id)) else {
                continue;
            };

            for (kind, term) in meta.iter_terms() {
                self.catalog.insert(kind, term);
                row.markers.insert(term.slug.clone());
            }
            row.tracked = true;
            row.selected = true;
            tracked += 1;
        }

        for kind in MetaKind::ALL {
            self.offered.insert(kind, self.catalog.options(kind, None));
        }
        self.selection = FilterSelection::default();
        self.special_rows_visible = true;
        self.state = FilterState::Ready;

        Ok(tracked)
    }

    /// 修改单个维度的取值，需随后调用 [`FilterEngine::apply`]
    pub fn select(&mut self, kind: MetaKind, choice: Choice) -> Result<(), FilterError> {
        self.ensure_interactive("select")?;
        self.selection.set(kind, choice);
        Ok(())
    }

    /// 整体替换筛选条件，需随后调用 [`FilterEngine::apply`]
    pub fn set_selection(&mut self, selection: FilterSelection) -> Result<(), FilterError> {
        self.ensure_interactive("set_selection")?;
        self.selection = selection;
        Ok(())
    }

    /// 按当前筛选条件重新计算选中行与可用选项
    ///
    /// 若某个已选 slug 在重新计算后不再提供，该维度回退为 "全部" 并再计算一次。
    pub fn apply(&mut self) -> Result<FilterOutcome, FilterError> {
        self.ensure_interactive("apply")?;

        let mut reverted = self.recompute();
        if !reverted.is_empty() {
            for &kind in &reverted {
                self.selection.set(kind, Choice::All);
            }
            // 剩余的具体选择都能在选中行上找到，第二次计算不会再回退
            let again = self.recompute();
            reverted.extend(again);
        }

        self.state = if self.selection.is_all() {
            FilterState::Ready
        } else {
            FilterState::Filtered
        };

        Ok(FilterOutcome {
            selected_rows: self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.selected)
                .map(|(i, _)| i)
                .collect(),
            special_rows_visible: self.special_rows_visible,
            reverted,
        })
    }

    /// 所有维度恢复为 "全部" 并重新计算
    pub fn reset(&mut self) -> Result<FilterOutcome, FilterError> {
        self.set_selection(FilterSelection::default())?;
        self.apply()
    }

    // 一次完整的筛选计算，返回已选但不再提供的维度
    fn recompute(&mut self) -> Vec<MetaKind> {
        self.special_rows_visible = false;
        for row in &mut self.rows {
            row.selected = false;
        }

        // 从全部带元数据的行出发，依次与每个非 "全部" 维度求交集
        let mut survivors: Vec<usize> = (0..self.rows.len()).filter(|&i| self.rows[i].tracked).collect();
        for kind in MetaKind::ALL {
            if let Choice::Slug(slug) = self.selection.get(kind) {
                survivors.retain(|&i| self.rows[i].has_marker(slug));
            }
        }

        if self.selection.is_all() {
            self.special_rows_visible = true;
        }

        for &i in &survivors {
            self.rows[i].selected = true;
        }

        let present: HashSet<&str> = survivors
            .iter()
            .flat_map(|&i| self.rows[i].markers.iter().map(String::as_str))
            .collect();

        for kind in MetaKind::ALL {
            self.offered.insert(kind, self.catalog.options(kind, Some(&present)));
        }

        MetaKind::ALL
            .into_iter()
            .filter(|&kind| match self.selection.get(kind) {
                Choice::All => false,
                Choice::Slug(slug) => !self.options(kind).iter().any(|option| &option.value == slug),
            })
            .collect()
    }

    fn ensure_interactive(&self, operation: &'static str) -> Result<(), FilterError> {
        if self.state.is_interactive() {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> FilterError {
        FilterError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}
