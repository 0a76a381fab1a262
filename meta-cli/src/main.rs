use std::fs;
use clap::{Arg, ArgAction, Command};

use post_meta::{metadata_for_posts, ContentExport};

mod page_scan;

use page_scan::scan_post_ids;

// 主函数
fn main() {
    // 设置命令行参数
    let matches = Command::new("统计页元数据查询")
        .version(env!("CARGO_PKG_VERSION"))
        .about("根据内容导出文件为统计页中的文章生成分类、标签与作者元数据")
        .arg(Arg::new("content")
            .short('c')
            .long("content")
            .value_name("EXPORT_JSON")
            .help("内容导出文件路径")
            .required(true))
        .arg(Arg::new("page")
            .short('p')
            .long("page")
            .value_name("STATS_HTML")
            .help("保存下来的统计页，从中提取文章ID"))
        .arg(Arg::new("id")
            .short('i')
            .long("id")
            .value_name("POST_ID")
            .help("额外查询的文章ID，可重复")
            .action(ArgAction::Append))
        .arg(Arg::new("post_param")
            .long("post-param")
            .value_name("NAME")
            .help("统计链接中携带文章ID的参数名")
            .default_value("post"))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("OUTPUT_JSON")
            .help("结果输出路径，缺省时写到标准输出"))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .action(ArgAction::SetTrue))
        .get_matches();

    // 获取参数值
    let content_path = matches.get_one::<String>("content").unwrap();
    let page_path = matches.get_one::<String>("page");
    let extra_ids: Vec<String> = matches
        .get_many::<String>("id")
        .map(|ids| ids.cloned().collect())
        .unwrap_or_default();
    let post_param = matches.get_one::<String>("post_param").unwrap();
    let output_path = matches.get_one::<String>("output");
    let verbose = matches.get_flag("verbose");

    if page_path.is_none() && extra_ids.is_empty() {
        eprintln!("错误: 需要通过 --page 或 --id 指定文章");
        std::process::exit(1);
    }

    match run(content_path, page_path, extra_ids, post_param, output_path, verbose) {
        Ok(count) => {
            if verbose {
                eprintln!("查询完成，共 {} 篇文章", count);
            }
        }
        Err(e) => {
            eprintln!("错误: {}", e);
            std::process::exit(1);
        }
    }
}

// 收集文章ID、查询元数据并输出，返回结果中的文章数
fn run(
    content_path: &str,
    page_path: Option<&String>,
    extra_ids: Vec<String>,
    post_param: &str,
    output_path: Option<&String>,
    verbose: bool,
) -> Result<usize, String> {
    let mut post_ids = Vec::new();

    if let Some(page_path) = page_path {
        let html = fs::read_to_string(page_path)
            .map_err(|e| format!("无法读取统计页 {}: {}", page_path, e))?;
        let scan = scan_post_ids(&html, post_param)?;

        if verbose {
            eprintln!("统计页: {} 行，提取 {} 个文章ID，{} 行缺少统计链接",
                     scan.rows, scan.post_ids.len(), scan.skipped);
        }
        post_ids.extend(scan.post_ids);
    }
    post_ids.extend(extra_ids);

    if post_ids.is_empty() {
        return Err("没有找到文章ID".to_string());
    }

    let export = ContentExport::from_path(content_path).map_err(|e| e.to_string())?;
    if verbose {
        eprintln!("内容导出: {} 篇文章", export.post_count());
    }

    let posts_meta = metadata_for_posts(&export, &post_ids);
    let json = serde_json::to_string_pretty(&posts_meta)
        .map_err(|e| format!("序列化结果失败: {}", e))?;

    match output_path {
        Some(path) => {
            fs::write(path, json).map_err(|e| format!("无法写入 {}: {}", path, e))?;
            if verbose {
                eprintln!("结果已写入: {}", path);
            }
        }
        None => println!("{}", json),
    }

    Ok(posts_meta.len())
}
