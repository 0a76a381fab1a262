use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::Event;
use utils_common::{MetaKind, PostsMeta};

// 导出模块
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod models;
pub mod page;
mod console;

pub use config::FilterConfig;
pub use engine::FilterEngine;
pub use error::FilterError;
pub use models::{Choice, FilterOutcome, FilterRow, FilterSelection, FilterState};

use page::{RenderPlan, StatsPage};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 宿主页面注入接口地址所用的全局变量
const API_URL_GLOBAL: &str = "filterForJetpackSiteStatsApiUrl";

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 统计页上的筛选组件 - 每个页面构造一次
pub struct StatsFilter {
    engine: FilterEngine,
    page: StatsPage,
}

impl StatsFilter {
    /// 等待统计表、查询元数据并启用筛选
    ///
    /// 查询失败时控件保持不可用，错误交由调用方展示。
    pub async fn mount(config: &FilterConfig) -> Result<Rc<RefCell<StatsFilter>>, FilterError> {
        let window = web_sys::window().ok_or_else(|| FilterError::Page("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| FilterError::Page("no document".to_string()))?;

        let container = page::wait_for(&document, &config.container_selector, config.wait_timeout_ms).await?;

        let (page, post_ids) = StatsPage::collect(&document, &container, config)?;
        let mut engine = FilterEngine::new(post_ids);
        engine.begin_loading()?;

        let post_ids = engine.post_ids();
        console::log(&format!(
            "stats table found: {} row(s), looking up {} post(s)",
            engine.rows().len(),
            post_ids.len()
        ));

        let fetched = lookup::fetch_posts_meta(&window, config, &post_ids).await;
        let filter = Rc::new(RefCell::new(StatsFilter { engine, page }));

        match fetched {
            Ok(posts_meta) => {
                Self::init_filter(&filter, &posts_meta)?;
                Ok(filter)
            }
            Err(error) => {
                filter.borrow_mut().engine.fail(&error)?;
                Err(error)
            }
        }
    }

    // 附加元数据、填充选项、注册事件，最后解除不可用状态
    fn init_filter(filter: &Rc<RefCell<StatsFilter>>, posts_meta: &PostsMeta) -> Result<(), FilterError> {
        let ready = {
            let mut guard = filter.borrow_mut();
            let this = &mut *guard;

            let tracked = this.engine.init_filter(posts_meta)?;
            let plan = RenderPlan::from_engine(&this.engine);
            this.page.mark_rows(&this.engine)?;
            this.page.controls().sync_options(&plan)?;

            console::log(&format!(
                "metadata attached to {} of {} row(s), {} filter value(s)",
                tracked,
                this.engine.rows().len(),
                this.engine.catalog().len()
            ));
            plan.controls_enabled
        };

        Self::wire(filter)?;
        if ready {
            filter.borrow().page.controls().set_ready()?;
        }
        Ok(())
    }

    fn wire(filter: &Rc<RefCell<StatsFilter>>) -> Result<(), FilterError> {
        let this = filter.borrow();
        let controls = this.page.controls();

        for kind in MetaKind::ALL {
            let handle = Rc::clone(filter);
            let on_change = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                if let Err(e) = handle.borrow_mut().on_change() {
                    console::error(&format!("filtering failed: {}", e));
                }
            });
            controls
                .select(kind)
                .add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())
                .map_err(|e| FilterError::Page(error::js_error_text(&e)))?;
            on_change.forget();
        }

        let handle = Rc::clone(filter);
        let on_reset = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            // change 事件会同步执行筛选，派发前必须释放借用
            let category = {
                let this = handle.borrow();
                this.page.controls().select_all();
                this.page.controls().select(MetaKind::Category).clone()
            };
            if let Err(e) = page::dispatch_change(&category) {
                console::error(&format!("reset failed: {}", e));
            }
        });
        controls
            .reset_button()
            .add_event_listener_with_callback("click", on_reset.as_ref().unchecked_ref())
            .map_err(|e| FilterError::Page(error::js_error_text(&e)))?;
        on_reset.forget();

        Ok(())
    }

    // 任一下拉框变化：读取选择、重新计算并同步页面
    fn on_change(&mut self) -> Result<FilterOutcome, FilterError> {
        let selection = self.page.controls().read_selection();
        self.engine.set_selection(selection)?;

        let outcome = self.engine.apply()?;
        self.page.render(&self.engine)?;

        if !outcome.reverted.is_empty() {
            console::log(&format!("selection no longer available, reverted: {:?}", outcome.reverted));
        }
        Ok(outcome)
    }
}

// 后台运行挂载流程，失败时在页面头部提示
fn spawn_mount(config: FilterConfig) {
    spawn_local(async move {
        if let Err(error) = StatsFilter::mount(&config).await {
            match web_sys::window().and_then(|window| window.document()) {
                Some(document) => page::show_error(&document, &config, &error),
                None => console::error(&error.to_string()),
            }
        }
    });
}

/// 筛选器JS接口 - 提供给宿主页面的挂载入口
#[wasm_bindgen]
pub struct StatsFilterJS;

#[wasm_bindgen]
impl StatsFilterJS {
    /// 按 JSON 配置挂载
    #[wasm_bindgen]
    pub fn mount(config_json: &str) -> Result<(), JsValue> {
        let config = FilterConfig::from_json(config_json)?;
        spawn_mount(config);
        Ok(())
    }

    /// 使用默认页面结构挂载，接口地址取自宿主注入的全局变量
    #[wasm_bindgen]
    pub fn mount_default() -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let api_url = js_sys::Reflect::get(&window, &JsValue::from_str(API_URL_GLOBAL))?
            .as_string()
            .ok_or_else(|| FilterError::Config(format!("global `{}` is not set", API_URL_GLOBAL)))?;

        spawn_mount(FilterConfig::with_api_url(api_url)?);
        Ok(())
    }
}
