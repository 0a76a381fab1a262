use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// 筛选器错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// 等待超时仍未找到统计表容器
    #[error("stats container `{selector}` did not appear within {timeout_ms} ms")]
    TargetNotFound { selector: String, timeout_ms: u32 },

    /// 元数据接口返回非成功状态
    #[error("HTTP {status} {status_text}")]
    MetadataFetchFailed { status: u16, status_text: String },

    /// 请求未能完成（网络错误、被拦截等）
    #[error("request failed: {0}")]
    Network(String),

    /// 响应无法解析为元数据
    #[error("invalid metadata response: {0}")]
    InvalidResponse(String),

    /// 配置无效
    #[error("invalid configuration: {0}")]
    Config(String),

    /// 页面结构不符合预期
    #[error("unexpected page structure: {0}")]
    Page(String),

    /// 当前生命周期状态下不允许的操作
    #[error("operation `{operation}` not allowed in state `{state}`")]
    InvalidState { operation: &'static str, state: &'static str },
}

impl FilterError {
    /// 显示在页面顶部错误提示中的文本
    pub fn banner_detail(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<FilterError> for JsValue {
    fn from(error: FilterError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

/// 从 JS 异常中提取可读的错误信息
pub(crate) fn js_error_text(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failure_detail_includes_status() {
        let error = FilterError::MetadataFetchFailed {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        let detail = error.banner_detail();

        assert!(detail.contains("500"));
        assert_eq!(detail, "Error: HTTP 500 Internal Server Error");
    }
}
