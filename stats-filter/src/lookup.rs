use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};
use utils_common::{lookup_url, LookupResponse, PostsMeta};

use crate::config::FilterConfig;
use crate::error::{js_error_text, FilterError};

/// 批量查询文章元数据
///
/// 只发出一次请求，不重试；非成功状态码视为失败。
/// 没有文章ID时不发请求，直接返回空结果。
pub async fn fetch_posts_meta(window: &Window, config: &FilterConfig, post_ids: &[String]) -> Result<PostsMeta, FilterError> {
    if post_ids.is_empty() {
        return Ok(PostsMeta::new());
    }

    // 接口地址可能是相对地址，以当前页面为基准解析
    let base = window.location().href().ok().and_then(|href| Url::parse(&href).ok());
    let url = lookup_url(base.as_ref(), &config.api_url, &config.lookup_param, post_ids)
        .map_err(|e| FilterError::Config(format!("api_url `{}`: {}", config.api_url, e)))?;

    let response = JsFuture::from(window.fetch_with_str(url.as_str()))
        .await
        .map_err(|e| FilterError::Network(js_error_text(&e)))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| FilterError::InvalidResponse("fetch did not return a Response".to_string()))?;

    check_status(response.ok(), response.status(), response.status_text())?;

    let json = response.json().map_err(|e| FilterError::InvalidResponse(js_error_text(&e)))?;
    let body = JsFuture::from(json)
        .await
        .map_err(|e| FilterError::InvalidResponse(js_error_text(&e)))?;

    let parsed: LookupResponse =
        serde_wasm_bindgen::from_value(body).map_err(|e| FilterError::InvalidResponse(e.to_string()))?;

    Ok(parsed.into_posts_meta())
}

/// 非 2xx 状态码视为查询失败
pub fn check_status(ok: bool, status: u16, status_text: String) -> Result<(), FilterError> {
    if ok {
        Ok(())
    } else {
        Err(FilterError::MetadataFetchFailed { status, status_text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_passes() {
        assert!(check_status(true, 200, "OK".to_string()).is_ok());
    }

    #[test]
    fn server_error_becomes_fetch_failure() {
        let error = check_status(false, 500, "Internal Server Error".to_string()).unwrap_err();

        assert!(matches!(error, FilterError::MetadataFetchFailed { status: 500, .. }));
        assert_eq!(error.banner_detail(), "Error: HTTP 500 Internal Server Error");
    }

    #[test]
    fn not_found_is_a_failure() {
        assert!(matches!(
            check_status(false, 404, String::new()),
            Err(FilterError::MetadataFetchFailed { status: 404, .. })
        ));
    }
}
