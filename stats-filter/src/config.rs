use serde::Deserialize;
use utils_common::MetaKind;

use crate::error::FilterError;

/// 筛选器配置 - 由宿主页面以 JSON 传入
///
/// 除 `api_url` 外均有默认值，对应 Jetpack 统计页的结构。
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// 元数据查询接口地址
    pub api_url: String,
    /// 统计表所在容器，出现后才开始初始化
    #[serde(default = "default_container_selector")]
    pub container_selector: String,
    /// 容器内的数据行（排除表头行）
    #[serde(default = "default_row_selector")]
    pub row_selector: String,
    /// 筛选控件插入在该表格之前
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
    /// 错误提示插入位置
    #[serde(default = "default_header_selector")]
    pub header_selector: String,
    /// 行内的单篇统计链接
    #[serde(default = "default_stats_link_selector")]
    pub stats_link_selector: String,
    /// 统计链接中携带文章ID的参数名
    #[serde(default = "default_post_param")]
    pub post_param: String,
    /// 查询接口的文章ID参数名
    #[serde(default = "default_lookup_param")]
    pub lookup_param: String,
    /// 等待容器的超时时间（毫秒），为空时无限等待
    #[serde(default)]
    pub wait_timeout_ms: Option<u32>,
    #[serde(default)]
    pub labels: Labels,
}

/// 控件文字
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Labels {
    pub all_categories: String,
    pub all_tags: String,
    pub all_authors: String,
    pub reset: String,
    pub error_heading: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            all_categories: "All categories".to_string(),
            all_tags: "All tags".to_string(),
            all_authors: "All authors".to_string(),
            reset: "Reset".to_string(),
            error_heading: "Could not initialize Filter for Jetpack Site Stats:".to_string(),
        }
    }
}

impl Labels {
    /// "全部" 选项的文字
    pub fn all_label(&self, kind: MetaKind) -> &str {
        match kind {
            MetaKind::Category => &self.all_categories,
            MetaKind::Tag => &self.all_tags,
            MetaKind::Author => &self.all_authors,
        }
    }
}

fn default_container_selector() -> String {
    ".staticmetabox".to_string()
}

fn default_row_selector() -> String {
    "table.statsDay > tbody > tr:not(.h)".to_string()
}

fn default_table_selector() -> String {
    ".staticmetabox table".to_string()
}

fn default_header_selector() -> String {
    "#jp-stats-wrap .header".to_string()
}

fn default_stats_link_selector() -> String {
    ".more > a".to_string()
}

fn default_post_param() -> String {
    "post".to_string()
}

fn default_lookup_param() -> String {
    "p[]".to_string()
}

impl FilterConfig {
    /// 使用默认页面结构，仅指定接口地址
    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self, FilterError> {
        let config = Self {
            api_url: api_url.into(),
            container_selector: default_container_selector(),
            row_selector: default_row_selector(),
            table_selector: default_table_selector(),
            header_selector: default_header_selector(),
            stats_link_selector: default_stats_link_selector(),
            post_param: default_post_param(),
            lookup_param: default_lookup_param(),
            wait_timeout_ms: None,
            labels: Labels::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 解析配置
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let config: FilterConfig = serde_json::from_str(json).map_err(|e| FilterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), FilterError> {
        if self.api_url.trim().is_empty() {
            return Err(FilterError::Config("api_url must not be empty".to_string()));
        }
        if self.post_param.is_empty() || self.lookup_param.is_empty() {
            return Err(FilterError::Config("parameter names must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_jetpack_markup() {
        let config = FilterConfig::from_json(r#"{"api_url": "/wp-json/filter-for-jetpack-site-stats/v1/get/"}"#).unwrap();

        assert_eq!(config.container_selector, ".staticmetabox");
        assert_eq!(config.row_selector, "table.statsDay > tbody > tr:not(.h)");
        assert_eq!(config.post_param, "post");
        assert_eq!(config.lookup_param, "p[]");
        assert_eq!(config.wait_timeout_ms, None);
        assert_eq!(config.labels.all_label(MetaKind::Tag), "All tags");
    }

    #[test]
    fn partial_labels_keep_other_defaults() {
        let config = FilterConfig::from_json(r#"{"api_url": "x", "labels": {"reset": "Clear"}, "wait_timeout_ms": 5000}"#).unwrap();

        assert_eq!(config.labels.reset, "Clear");
        assert_eq!(config.labels.all_authors, "All authors");
        assert_eq!(config.wait_timeout_ms, Some(5000));
    }

    #[test]
    fn missing_api_url_is_rejected() {
        assert!(matches!(FilterConfig::from_json("{}"), Err(FilterError::Config(_))));
        assert!(matches!(FilterConfig::with_api_url("  "), Err(FilterError::Config(_))));
    }
}
