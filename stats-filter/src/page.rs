use std::cell::Cell;
use std::rc::Rc;
use js_sys::{Array, Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, HtmlAnchorElement, HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement,
    MutationObserver, MutationObserverInit, Node,
};
use utils_common::{post_id_from_href, MetaKind};

use crate::config::{FilterConfig, Labels};
use crate::console;
use crate::engine::FilterEngine;
use crate::error::{js_error_text, FilterError};
use crate::models::{Choice, FilterSelection, SelectOption, ALL_VALUE};

/// 控件外层容器的类名
const WRAPPER_CLASS: &str = "jetpack-site-stats-filter";
/// 元数据加载完成前的占位状态
const BUSY_CLASS: &str = "jssf-busy";
/// 重新计算期间挂在行容器上的过渡状态
const FILTERING_CLASS: &str = "jssf-filtering";
/// 已附加元数据的行
const FILTER_ROW_CLASS: &str = "jssf-filter-row";
/// 被当前筛选条件选中的行（显示与否由样式表决定）
const SELECTED_CLASS: &str = "selected";
/// 汇总行的展开标记
const PEEKABOO_CLASS: &str = "peekaboo";

fn page_err(value: JsValue) -> FilterError {
    FilterError::Page(js_error_text(&value))
}

/// 等待匹配选择器的元素出现
///
/// 元素已存在时立即返回；否则监听 `body` 子树的变化，出现后只解析一次。
/// 未设置超时时可能永远不会完成。
pub async fn wait_for(document: &Document, selector: &str, timeout_ms: Option<u32>) -> Result<Element, FilterError> {
    if let Some(element) = document.query_selector(selector).map_err(page_err)? {
        return Ok(element);
    }

    let mut setup_error = None;
    let promise = Promise::new(&mut |resolve: Function, reject: Function| {
        if let Err(e) = observe_until_present(document, selector, timeout_ms, resolve, reject) {
            setup_error = Some(e);
        }
    });
    if let Some(e) = setup_error {
        return Err(page_err(e));
    }

    match JsFuture::from(promise).await {
        Ok(value) => value
            .dyn_into::<Element>()
            .map_err(|_| FilterError::Page(format!("`{}` did not resolve to an element", selector))),
        Err(_) => Err(FilterError::TargetNotFound {
            selector: selector.to_string(),
            timeout_ms: timeout_ms.unwrap_or_default(),
        }),
    }
}

// 注册变化监听，元素出现时 resolve；设置了超时则到期 reject
fn observe_until_present(
    document: &Document,
    selector: &str,
    timeout_ms: Option<u32>,
    resolve: Function,
    reject: Function,
) -> Result<(), JsValue> {
    let target = document.clone();
    let selector = selector.to_string();
    // 超时计时器的句柄，元素出现时取消
    let timer: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let pending = Rc::clone(&timer);

    let on_mutation = Closure::<dyn FnMut(Array, MutationObserver)>::new(move |_records: Array, observer: MutationObserver| {
        if let Ok(Some(element)) = target.query_selector(&selector) {
            observer.disconnect();
            if let (Some(handle), Some(window)) = (pending.take(), web_sys::window()) {
                window.clear_timeout_with_handle(handle);
            }
            let _ = resolve.call1(&JsValue::NULL, &element);
        }
    });
    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    // 回调在页面生命周期内只注册一次
    on_mutation.forget();

    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);

    let root: Node = match document.body() {
        Some(body) => body.into(),
        None => document.clone().into(),
    };
    observer.observe_with_options(&root, &init)?;

    if let Some(timeout_ms) = timeout_ms {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let on_timeout = Closure::once_into_js(move || {
            observer.disconnect();
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("timeout"));
        });
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(on_timeout.unchecked_ref(), timer_delay(timeout_ms))?;
        timer.set(Some(handle));
    }

    Ok(())
}

// 浏览器计时器只接受 i32 毫秒，超出范围时取最大值
fn timer_delay(timeout_ms: u32) -> i32 {
    i32::try_from(timeout_ms).unwrap_or(i32::MAX)
}

/// 在页面头部插入错误提示
pub fn show_error(document: &Document, config: &FilterConfig, error: &FilterError) {
    let detail = error.banner_detail();
    console::error(&detail);

    if let Err(e) = insert_error_banner(document, &config.header_selector, &config.labels, &detail) {
        console::warn(&format!("could not show error banner: {}", e));
    }
}

fn insert_error_banner(document: &Document, header_selector: &str, labels: &Labels, detail: &str) -> Result<(), FilterError> {
    let header = document
        .query_selector(header_selector)
        .map_err(page_err)?
        .ok_or_else(|| FilterError::Page(format!("missing `{}`", header_selector)))?;

    let banner = document.create_element("div").map_err(page_err)?;
    banner.set_class_name("error");
    let paragraph = document.create_element("p").map_err(page_err)?;
    paragraph
        .append_child(&document.create_text_node(&labels.error_heading))
        .map_err(page_err)?;
    let br = document.create_element("br").map_err(page_err)?;
    paragraph.append_child(&br).map_err(page_err)?;
    paragraph.append_child(&document.create_text_node(detail)).map_err(page_err)?;
    banner.append_child(&paragraph).map_err(page_err)?;

    header.insert_adjacent_element("afterbegin", &banner).map_err(page_err)?;
    Ok(())
}

/// 触发下拉框的 change 事件
pub fn dispatch_change(select: &HtmlSelectElement) -> Result<(), FilterError> {
    let event = Event::new("change").map_err(page_err)?;
    select.dispatch_event(&event).map_err(page_err)?;
    Ok(())
}

/// 三个下拉框与重置按钮
pub struct Controls {
    wrapper: Element,
    category: HtmlSelectElement,
    tag: HtmlSelectElement,
    author: HtmlSelectElement,
    reset: HtmlInputElement,
}

impl Controls {
    /// 在统计表之前插入控件，初始为不可用状态
    fn insert(document: &Document, config: &FilterConfig) -> Result<Self, FilterError> {
        let table = document
            .query_selector(&config.table_selector)
            .map_err(page_err)?
            .ok_or_else(|| FilterError::Page(format!("missing `{}`", config.table_selector)))?;

        let wrapper = document.create_element("p").map_err(page_err)?;
        wrapper.set_class_name(&format!("{} {}", WRAPPER_CLASS, BUSY_CLASS));

        let make_select = |kind: MetaKind| -> Result<HtmlSelectElement, FilterError> {
            let select: HtmlSelectElement = document
                .create_element("select")
                .map_err(page_err)?
                .dyn_into()
                .map_err(|_| FilterError::Page("select element".to_string()))?;
            select.set_class_name(kind.class_name());
            select.set_disabled(true);

            let all = HtmlOptionElement::new_with_text_and_value(config.labels.all_label(kind), ALL_VALUE).map_err(page_err)?;
            all.set_class_name("all");
            select.append_child(&all).map_err(page_err)?;
            wrapper.append_child(&select).map_err(page_err)?;
            Ok(select)
        };
        let category = make_select(MetaKind::Category)?;
        let tag = make_select(MetaKind::Tag)?;
        let author = make_select(MetaKind::Author)?;

        let reset: HtmlInputElement = document
            .create_element("input")
            .map_err(page_err)?
            .dyn_into()
            .map_err(|_| FilterError::Page("input element".to_string()))?;
        reset.set_class_name("button reset");
        reset.set_type("button");
        reset.set_value(&config.labels.reset);
        reset.set_disabled(true);
        wrapper.append_child(&reset).map_err(page_err)?;

        table.insert_adjacent_element("beforebegin", &wrapper).map_err(page_err)?;

        Ok(Self {
            wrapper,
            category,
            tag,
            author,
            reset,
        })
    }

    pub fn select(&self, kind: MetaKind) -> &HtmlSelectElement {
        match kind {
            MetaKind::Category => &self.category,
            MetaKind::Tag => &self.tag,
            MetaKind::Author => &self.author,
        }
    }

    pub fn reset_button(&self) -> &HtmlInputElement {
        &self.reset
    }

    /// 读取用户当前的选择
    pub fn read_selection(&self) -> FilterSelection {
        FilterSelection {
            category: Choice::from_value(&self.category.value()),
            tag: Choice::from_value(&self.tag.value()),
            author: Choice::from_value(&self.author.value()),
        }
    }

    /// 全部设为 "全部"
    pub fn select_all(&self) {
        for kind in MetaKind::ALL {
            self.select(kind).set_value(ALL_VALUE);
        }
    }

    /// 元数据加载完成，控件可用
    pub fn set_ready(&self) -> Result<(), FilterError> {
        for kind in MetaKind::ALL {
            self.select(kind).set_disabled(false);
        }
        self.reset.set_disabled(false);
        self.wrapper.class_list().remove_1(BUSY_CLASS).map_err(page_err)
    }

    /// 用计划中的选项替换下拉框内容，并恢复选中值
    pub fn sync_options(&self, plan: &RenderPlan) -> Result<(), FilterError> {
        let stale = self
            .wrapper
            .query_selector_all(&format!("option:not([value=\"{}\"])", ALL_VALUE))
            .map_err(page_err)?;
        for i in 0..stale.length() {
            if let Some(option) = stale.get(i).and_then(|node| node.dyn_into::<Element>().ok()) {
                option.remove();
            }
        }

        for menu in &plan.menus {
            let select = self.select(menu.kind);
            for option in &menu.options {
                let element = HtmlOptionElement::new_with_text_and_value(&option.label, &option.value).map_err(page_err)?;
                select.append_child(&element).map_err(page_err)?;
            }
            select.set_value(&menu.value);
        }

        Ok(())
    }
}

/// 统计表中与筛选相关的元素
pub struct StatsPage {
    /// 数据行的父元素
    row_container: Element,
    /// "Home page / Archives" 汇总行
    postview_row: Option<HtmlElement>,
    /// 汇总行展开后的明细表格行
    table_row: Option<HtmlElement>,
    /// 可筛选行，文档顺序
    rows: Vec<HtmlElement>,
    controls: Controls,
}

impl StatsPage {
    /// 收集统计表的行并插入控件
    ///
    /// 返回页面对象与每个可筛选行的文章ID（缺少统计链接的行为 `None`）。
    pub fn collect(document: &Document, container: &Element, config: &FilterConfig) -> Result<(Self, Vec<Option<String>>), FilterError> {
        let found = container.query_selector_all(&config.row_selector).map_err(page_err)?;

        let mut postview_row = None;
        let mut table_row = None;
        let mut rows = Vec::new();
        let mut post_ids = Vec::new();

        for i in 0..found.length() {
            let Some(row) = found.get(i).and_then(|node| node.dyn_into::<HtmlElement>().ok()) else {
                continue;
            };

            if row.matches(".postview").map_err(page_err)? {
                if postview_row.is_none() {
                    postview_row = Some(row);
                }
            } else if row.matches(".table").map_err(page_err)? {
                if table_row.is_none() {
                    table_row = Some(row);
                }
            } else {
                post_ids.push(Self::post_id_of(&row, config)?);
                rows.push(row);
            }
        }

        let row_container = table_row
            .as_ref()
            .or(rows.first())
            .and_then(|row| row.parent_element())
            .unwrap_or_else(|| container.clone());

        let skipped = post_ids.iter().filter(|id| id.is_none()).count();
        if skipped > 0 {
            console::warn(&format!("{} row(s) without a stats link will stay visible", skipped));
        }

        let controls = Controls::insert(document, config)?;

        Ok((
            Self {
                row_container,
                postview_row,
                table_row,
                rows,
                controls,
            },
            post_ids,
        ))
    }

    // 从行内单篇统计链接的查询参数中读取文章ID
    fn post_id_of(row: &HtmlElement, config: &FilterConfig) -> Result<Option<String>, FilterError> {
        let Some(link) = row.query_selector(&config.stats_link_selector).map_err(page_err)? else {
            return Ok(None);
        };

        let href = match link.dyn_ref::<HtmlAnchorElement>() {
            Some(anchor) => Some(anchor.href()),
            None => link.get_attribute("href"),
        };
        Ok(href.and_then(|href| post_id_from_href(&href, &config.post_param)))
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// 将元数据作为类名附加到行上
    pub fn mark_rows(&self, engine: &FilterEngine) -> Result<(), FilterError> {
        for (element, row) in self.rows.iter().zip(engine.rows()) {
            if !row.tracked {
                continue;
            }
            let classes = element.class_list();
            for marker in &row.markers {
                // slug 含空白时无法作为类名，筛选仍以引擎中的标记为准
                if let Err(e) = classes.add_1(marker) {
                    console::warn(&format!("could not attach marker `{}`: {}", marker, js_error_text(&e)));
                }
            }
            classes.add_2(FILTER_ROW_CLASS, SELECTED_CLASS).map_err(page_err)?;
        }
        Ok(())
    }

    /// 根据引擎状态同步行与下拉框
    pub fn render(&self, engine: &FilterEngine) -> Result<(), FilterError> {
        let plan = RenderPlan::from_engine(engine);
        self.row_container.class_list().add_1(FILTERING_CLASS).map_err(page_err)?;

        for special in [&self.postview_row, &self.table_row].into_iter().flatten() {
            set_display(special, Some("none"))?;
        }
        if let Some(postview) = &self.postview_row {
            postview.class_list().remove_1(PEEKABOO_CLASS).map_err(page_err)?;
        }

        for (element, &selected) in self.rows.iter().zip(&plan.selected) {
            element
                .class_list()
                .toggle_with_force(SELECTED_CLASS, selected)
                .map_err(page_err)?;
        }

        if plan.special_rows == SpecialRows::Restored {
            if let Some(postview) = &self.postview_row {
                set_display(postview, plan.special_rows.postview_display())?;
            }
            if let Some(table) = &self.table_row {
                set_display(table, plan.special_rows.table_display())?;
            }
        }

        self.row_container.class_list().remove_1(FILTERING_CLASS).map_err(page_err)?;

        self.controls.sync_options(&plan)
    }
}

// `None` 表示移除内联样式
fn set_display(element: &HtmlElement, display: Option<&str>) -> Result<(), FilterError> {
    let style = element.style();
    match display {
        Some(value) => style.set_property("display", value).map_err(page_err),
        None => style.remove_property("display").map(|_| ()).map_err(page_err),
    }
}

/// 汇总行与明细行的显示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialRows {
    /// 有任一具体筛选条件，两行都隐藏
    Hidden,
    /// 全部为 "全部"：汇总行恢复，明细行交还给页面样式（折叠状态）
    Restored,
}

impl SpecialRows {
    pub fn postview_display(self) -> Option<&'static str> {
        match self {
            SpecialRows::Hidden => Some("none"),
            SpecialRows::Restored => Some("table-row"),
        }
    }

    pub fn table_display(self) -> Option<&'static str> {
        match self {
            SpecialRows::Hidden => Some("none"),
            SpecialRows::Restored => None,
        }
    }
}

/// 一个下拉框的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    pub kind: MetaKind,
    /// "全部" 之后的具体选项
    pub options: Vec<SelectOption>,
    /// 同步后的选中值
    pub value: String,
}

/// 引擎状态映射到页面上的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    /// 每个可筛选行是否带 `selected` 类，文档顺序
    pub selected: Vec<bool>,
    pub special_rows: SpecialRows,
    pub menus: Vec<SelectMenu>,
    /// 控件是否可用（否则保持 `jssf-busy`）
    pub controls_enabled: bool,
}

impl RenderPlan {
    pub fn from_engine(engine: &FilterEngine) -> Self {
        Self {
            selected: engine.rows().iter().map(|row| row.tracked && row.selected).collect(),
            special_rows: if engine.special_rows_visible() {
                SpecialRows::Restored
            } else {
                SpecialRows::Hidden
            },
            menus: MetaKind::ALL
                .into_iter()
                .map(|kind| SelectMenu {
                    kind,
                    options: engine.options(kind).to_vec(),
                    value: engine.selection().get(kind).as_value().to_string(),
                })
                .collect(),
            controls_enabled: engine.state().is_interactive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils_common::{MetaTerm, PostMeta, PostsMeta};

    fn ready_engine() -> FilterEngine {
        let mut posts = PostsMeta::new();
        posts.insert(
            "1".to_string(),
            PostMeta {
                categories: vec![MetaTerm::new("category-news", "News")],
                tags: vec![MetaTerm::new("tag-breaking", "Breaking")],
                authors: vec![MetaTerm::new("author-Smith-1", "Jane Smith")],
            },
        );
        posts.insert(
            "2".to_string(),
            PostMeta {
                categories: vec![MetaTerm::new("category-sports", "Sports")],
                tags: vec![],
                authors: vec![MetaTerm::new("author-Smith-1", "Jane Smith")],
            },
        );

        let mut engine = FilterEngine::new(vec![Some("1".to_string()), None, Some("2".to_string())]);
        engine.begin_loading().unwrap();
        engine.init_filter(&posts).unwrap();
        engine
    }

    fn menu<'a>(plan: &'a RenderPlan, kind: MetaKind) -> &'a SelectMenu {
        plan.menus.iter().find(|menu| menu.kind == kind).unwrap()
    }

    #[test]
    fn initial_plan_restores_special_rows_and_enables_controls() {
        let plan = RenderPlan::from_engine(&ready_engine());

        assert_eq!(plan.selected, vec![true, false, true]);
        assert_eq!(plan.special_rows, SpecialRows::Restored);
        assert!(plan.controls_enabled);
        assert_eq!(menu(&plan, MetaKind::Category).options.len(), 2);
        assert_eq!(menu(&plan, MetaKind::Category).value, ALL_VALUE);
    }

    #[test]
    fn filtered_plan_hides_special_rows_and_keeps_selected_values() {
        let mut engine = ready_engine();
        engine.select(MetaKind::Category, Choice::from_value("category-news")).unwrap();
        engine.apply().unwrap();

        let plan = RenderPlan::from_engine(&engine);
        assert_eq!(plan.selected, vec![true, false, false]);
        assert_eq!(plan.special_rows, SpecialRows::Hidden);

        let category = menu(&plan, MetaKind::Category);
        assert_eq!(category.value, "category-news");
        assert_eq!(category.options.iter().map(|o| o.value.as_str()).collect::<Vec<_>>(), vec!["category-news"]);
        assert_eq!(menu(&plan, MetaKind::Tag).value, ALL_VALUE);
        assert_eq!(menu(&plan, MetaKind::Tag).options.len(), 1);
    }

    #[test]
    fn reset_plan_matches_initial_plan() {
        let mut engine = ready_engine();
        let initial = RenderPlan::from_engine(&engine);

        engine.select(MetaKind::Tag, Choice::from_value("tag-breaking")).unwrap();
        engine.apply().unwrap();
        engine.reset().unwrap();

        assert_eq!(RenderPlan::from_engine(&engine), initial);
    }

    #[test]
    fn failed_lookup_keeps_controls_busy() {
        let mut engine = FilterEngine::new(vec![Some("1".to_string())]);
        engine.begin_loading().unwrap();
        let error = FilterError::MetadataFetchFailed {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        engine.fail(&error).unwrap();

        let plan = RenderPlan::from_engine(&engine);
        assert!(!plan.controls_enabled);
        assert!(plan.menus.iter().all(|menu| menu.options.is_empty()));
        assert!(error.banner_detail().contains("500"));
    }

    #[test]
    fn loading_keeps_controls_busy() {
        let mut engine = FilterEngine::new(vec![]);
        engine.begin_loading().unwrap();
        assert!(!RenderPlan::from_engine(&engine).controls_enabled);
    }

    #[test]
    fn special_row_displays() {
        assert_eq!(SpecialRows::Hidden.postview_display(), Some("none"));
        assert_eq!(SpecialRows::Hidden.table_display(), Some("none"));
        assert_eq!(SpecialRows::Restored.postview_display(), Some("table-row"));
        assert_eq!(SpecialRows::Restored.table_display(), None);
    }

    #[test]
    fn timer_delay_clamps_to_i32() {
        assert_eq!(timer_delay(5_000), 5_000);
        assert_eq!(timer_delay(u32::MAX), i32::MAX);
    }
}
