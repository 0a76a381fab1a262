use url::Url;

/// 相对链接的解析基准（统计页位于后台目录下）
const RELATIVE_BASE: &str = "http://localhost/wp-admin/";

/// 从单篇统计链接中提取文章ID
///
/// 链接可以是绝对地址，也可以是相对地址（保存下来的页面中常见）。
/// 无法解析、缺少参数或参数为空时返回 `None`。
pub fn post_id_from_href(href: &str, param: &str) -> Option<String> {
    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE).ok()?.join(href).ok()?,
        Err(_) => return None,
    };

    // 与 URLSearchParams.get 一致，取第一次出现的值
    url.query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// 构建元数据查询地址，每个文章ID作为一个重复参数
pub fn lookup_url(base: Option<&Url>, api_url: &str, param: &str, post_ids: &[String]) -> Result<Url, url::ParseError> {
    let mut url = Url::options().base_url(base).parse(api_url)?;

    if !post_ids.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for post_id in post_ids {
            pairs.append_pair(param, post_id);
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_post_from_absolute_link() {
        let href = "https://example.com/wp-admin/admin.php?page=stats&view=post&post=1234";
        assert_eq!(post_id_from_href(href, "post").as_deref(), Some("1234"));
    }

    #[test]
    fn extracts_post_from_relative_link() {
        let href = "admin.php?page=stats&view=post&post=56";
        assert_eq!(post_id_from_href(href, "post").as_deref(), Some("56"));
    }

    #[test]
    fn first_occurrence_wins() {
        let href = "admin.php?post=1&post=2";
        assert_eq!(post_id_from_href(href, "post").as_deref(), Some("1"));
    }

    #[test]
    fn missing_or_empty_param_is_none() {
        assert_eq!(post_id_from_href("admin.php?page=stats&view=post", "post"), None);
        assert_eq!(post_id_from_href("admin.php?post=", "post"), None);
        assert_eq!(post_id_from_href("http://[::1", "post"), None);
    }

    #[test]
    fn lookup_url_repeats_param() {
        let ids = vec!["12".to_string(), "34".to_string()];
        let url = lookup_url(None, "https://example.com/wp-json/filter-for-jetpack-site-stats/v1/get/", "p[]", &ids).unwrap();

        let values: Vec<String> = url
            .query_pairs()
            .filter(|(key, _)| key == "p[]")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(values, ids);
        assert_eq!(url.path(), "/wp-json/filter-for-jetpack-site-stats/v1/get/");
    }

    #[test]
    fn lookup_url_keeps_existing_query() {
        let ids = vec!["7".to_string()];
        let url = lookup_url(None, "https://example.com/?rest_route=/filter-for-jetpack-site-stats/v1/get/", "p[]", &ids).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(pairs[0].0, "rest_route");
        assert_eq!(pairs[1], ("p[]".to_string(), "7".to_string()));
    }

    #[test]
    fn lookup_url_resolves_relative_api_url() {
        let base = Url::parse("https://example.com/wp-admin/admin.php?page=stats").unwrap();
        let url = lookup_url(Some(&base), "/wp-json/x/v1/get/", "p[]", &[]).unwrap();

        assert_eq!(url.as_str(), "https://example.com/wp-json/x/v1/get/");
    }
}
