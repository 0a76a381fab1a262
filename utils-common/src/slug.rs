use crate::models::MetaKind;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// 非 ASCII 字母字符
static NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-zA-Z]").expect("静态正则表达式无效"));

/// 生成带类型前缀的 slug，例如 `category-news`
pub fn term_slug(kind: MetaKind, slug: &str) -> String {
    format!("{}{}", kind.prefix(), slug)
}

/// 生成作者 slug: `author-<姓氏>-<作者ID>`
pub fn author_slug(last_name: &str, author_id: u64) -> String {
    format!("{}{}-{}", MetaKind::Author.prefix(), sanitize_last_name(last_name), author_id)
}

/// 清理姓氏 - 转写为 ASCII 后只保留字母
pub fn sanitize_last_name(last_name: &str) -> String {
    NON_LETTERS.replace_all(&transliterate(last_name), "").into_owned()
}

/// 将文本转写为纯 ASCII
///
/// 先做兼容分解，去掉组合附加符号；没有分解形式的常见拉丁字母查表替换，
/// 其余无法转写的字符直接丢弃。
pub fn transliterate(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for c in input.nfkd() {
        if c.is_ascii() {
            output.push(c);
        } else if let Some(replacement) = latin_replacement(c) {
            output.push_str(replacement);
        }
    }

    output
}

// 无法通过 Unicode 分解得到 ASCII 的拉丁字母
fn latin_replacement(c: char) -> Option<&'static str> {
    let replacement = match c {
        'ß' => "ss",
        'Æ' => "AE",
        'æ' => "ae",
        'Œ' => "OE",
        'œ' => "oe",
        'Ø' => "O",
        'ø' => "o",
        'Đ' | 'Ð' => "D",
        'đ' | 'ð' => "d",
        'Ł' => "L",
        'ł' => "l",
        'Þ' => "TH",
        'þ' => "th",
        'ı' => "i",
        _ => return None,
    };
    Some(replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_term_slugs() {
        assert_eq!(term_slug(MetaKind::Category, "news"), "category-news");
        assert_eq!(term_slug(MetaKind::Tag, "breaking"), "tag-breaking");
    }

    #[test]
    fn author_slug_strips_accents_and_punctuation() {
        assert_eq!(author_slug("Smith", 1), "author-Smith-1");
        assert_eq!(author_slug("Müller-Lüdenscheidt", 7), "author-MullerLudenscheidt-7");
        assert_eq!(author_slug("O'Brien Jr.", 42), "author-OBrienJr-42");
    }

    #[test]
    fn author_slug_with_empty_last_name() {
        assert_eq!(author_slug("", 3), "author--3");
    }

    #[test]
    fn transliterates_letters_without_decomposition() {
        assert_eq!(sanitize_last_name("Straße"), "Strasse");
        assert_eq!(sanitize_last_name("Łukasiewicz"), "Lukasiewicz");
        assert_eq!(sanitize_last_name("Ødegård"), "Odegard");
    }

    #[test]
    fn drops_untransliterable_scripts() {
        assert_eq!(sanitize_last_name("山田"), "");
        assert_eq!(sanitize_last_name("Li 李"), "Li");
    }
}
