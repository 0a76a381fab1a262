use wasm_bindgen::JsValue;
use web_sys::console;

// 浏览器控制台日志，统一加前缀便于在后台页面中辨认

const PREFIX: &str = "[stats-filter]";

pub fn log(message: &str) {
    console::log_1(&JsValue::from_str(&format!("{} {}", PREFIX, message)));
}

pub fn warn(message: &str) {
    console::warn_1(&JsValue::from_str(&format!("{} {}", PREFIX, message)));
}

pub fn error(message: &str) {
    console::error_1(&JsValue::from_str(&format!("{} {}", PREFIX, message)));
}
