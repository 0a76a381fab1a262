use utils_common::{author_slug, term_slug, MetaKind, MetaTerm, PostMeta, PostsMeta};

use crate::source::{Author, ContentSource, Term};

/// 解析请求中的文章ID，非正整数视为无效
pub fn parse_post_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|&id| id > 0)
}

/// 查询一批文章的分类、标签与作者
///
/// 无效或不存在的文章ID不会出现在结果中。
/// 每篇文章恰好一位作者，slug 形如 `author-<姓氏>-<作者ID>`。
pub fn metadata_for_posts<S: ContentSource + ?Sized>(source: &S, post_ids: &[String]) -> PostsMeta {
    let mut posts = PostsMeta::new();

    for raw in post_ids {
        let Some(post_id) = parse_post_id(raw) else {
            continue;
        };
        if !source.post_exists(post_id) {
            continue;
        }

        let author = source.author_of(post_id).unwrap_or_default();

        posts.insert(
            post_id.to_string(),
            PostMeta {
                categories: prefixed(MetaKind::Category, source.categories(post_id)),
                tags: prefixed(MetaKind::Tag, source.tags(post_id)),
                authors: vec![author_term(&author)],
            },
        );
    }

    posts
}

fn prefixed(kind: MetaKind, terms: Vec<Term>) -> Vec<MetaTerm> {
    terms
        .into_iter()
        .map(|term| MetaTerm::new(term_slug(kind, &term.slug), term.name))
        .collect()
}

fn author_term(author: &Author) -> MetaTerm {
    MetaTerm::new(author_slug(&author.last_name, author.id), author.display_name.clone())
}
