use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use utils_common::post_id_from_href;

/// 不参与筛选的行: 表头、汇总行、明细行
const SKIPPED_ROW_CLASSES: [&str; 3] = ["h", "postview", "table"];

/// 统计页扫描结果
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageScan {
    /// 文档顺序的文章ID
    pub post_ids: Vec<String>,
    /// 可筛选行数
    pub rows: usize,
    /// 缺少统计链接（或链接中没有文章ID）的行数
    pub skipped: usize,
}

/// 扫描保存下来的统计页，按浏览器端相同的规则收集文章ID
pub fn scan_post_ids(html: &str, post_param: &str) -> Result<PageScan, String> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| format!("解析HTML时出错: {}", e))?;

    let mut tables = Vec::new();
    find_stats_tables(&dom.document, &mut tables);

    let mut scan = PageScan::default();
    for table in &tables {
        // table.statsDay > tbody > tr
        for tbody in element_children(table, "tbody") {
            for row in element_children(&tbody, "tr") {
                if SKIPPED_ROW_CLASSES.iter().any(|class| has_class(&row, class)) {
                    continue;
                }
                scan.rows += 1;

                let post_id = find_stats_link(&row, false)
                    .and_then(|link| attribute(&link, "href"))
                    .and_then(|href| post_id_from_href(&href, post_param));
                match post_id {
                    Some(post_id) => scan.post_ids.push(post_id),
                    None => scan.skipped += 1,
                }
            }
        }
    }

    Ok(scan)
}

// 查找所有 table.statsDay
fn find_stats_tables(handle: &Handle, tables: &mut Vec<Handle>) {
    if is_element(handle, "table") && has_class(handle, "statsDay") {
        tables.push(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        find_stats_tables(child, tables);
    }
}

// 查找 `.more > a`
fn find_stats_link(handle: &Handle, parent_is_more: bool) -> Option<Handle> {
    if parent_is_more && is_element(handle, "a") {
        return Some(handle.clone());
    }

    let is_more = has_class(handle, "more");
    for child in handle.children.borrow().iter() {
        if let Some(link) = find_stats_link(child, is_more) {
            return Some(link);
        }
    }
    None
}

fn element_children(handle: &Handle, tag: &str) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|child| is_element(child, tag))
        .cloned()
        .collect()
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(handle.data, NodeData::Element { ref name, .. } if name.local.as_ref() == tag)
}

fn has_class(handle: &Handle, class: &str) -> bool {
    attribute(handle, "class").map_or(false, |value| value.split_whitespace().any(|c| c == class))
}

fn attribute(handle: &Handle, name: &str) -> Option<String> {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div id="jp-stats-wrap"><div class="header"></div>
<div class="staticmetabox">
<table class="statsDay">
<tbody>
  <tr class="h"><th>Title</th><th>Views</th></tr>
  <tr class="postview"><td>Home page / Archives</td><td>120</td></tr>
  <tr class="table"><td colspan="2"><table><tr><td>nested</td></tr></table></td></tr>
  <tr><td><a href="https://example.com/first">First</a> <span class="more"><a href="admin.php?page=stats&amp;view=post&amp;post=12">stats</a></span></td><td>50</td></tr>
  <tr><td>No link here</td><td>9</td></tr>
  <tr class="alternate"><td><span class="more"><a href="https://example.com/wp-admin/admin.php?page=stats&amp;view=post&amp;post=7">stats</a></span></td><td>3</td></tr>
</tbody>
</table>
</div></div>
</body></html>"#;

    #[test]
    fn collects_ids_in_document_order() {
        let scan = scan_post_ids(PAGE, "post").unwrap();

        assert_eq!(scan.post_ids, vec!["12", "7"]);
        assert_eq!(scan.rows, 3);
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn ignores_tables_without_stats_class() {
        let html = r#"<table><tbody><tr><td><span class="more"><a href="x.php?post=1">s</a></span></td></tr></tbody></table>"#;
        let scan = scan_post_ids(html, "post").unwrap();

        assert!(scan.post_ids.is_empty());
        assert_eq!(scan.rows, 0);
    }

    #[test]
    fn link_outside_more_is_not_a_stats_link() {
        let html = r#"<table class="statsDay"><tr><td><a href="x.php?post=5">title</a></td></tr></table>"#;
        let scan = scan_post_ids(html, "post").unwrap();

        assert_eq!(scan.rows, 1);
        assert_eq!(scan.skipped, 1);
    }
}
