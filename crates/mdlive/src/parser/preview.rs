//! Best-effort local markdown to HTML conversion.
//!
//! Covers headers, bold/italic, unordered lists, fenced and inline code and
//! paragraph breaks. Nested emphasis, tables and nested lists are left to the
//! server-side renderer.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::highlight::escape_html;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([\w+-]*)[ \t]*\n(.*?)\n?```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.*)$").unwrap());
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.*)$").unwrap());
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[-*] (.*)$").unwrap());
static LIST_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:<li>.*</li>\n?)+").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00(BLOCK|INLINE)(\d+)\x00").unwrap());

struct CodeBlock {
    lang: String,
    code: String,
}

/// Convert a slide body to HTML markup.
pub fn to_markup(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }

    let mut html = escape_html(body);

    let mut blocks: Vec<CodeBlock> = Vec::new();
    html = FENCED_CODE
        .replace_all(&html, |caps: &Captures| {
            blocks.push(CodeBlock {
                lang: caps[1].to_string(),
                code: caps[2].to_string(),
            });
            format!("\x00BLOCK{}\x00", blocks.len() - 1)
        })
        .into_owned();

    let mut inline: Vec<String> = Vec::new();
    html = INLINE_CODE
        .replace_all(&html, |caps: &Captures| {
            inline.push(caps[1].to_string());
            format!("\x00INLINE{}\x00", inline.len() - 1)
        })
        .into_owned();

    html = H3.replace_all(&html, "<h3>$1</h3>").into_owned();
    html = H2.replace_all(&html, "<h2>$1</h2>").into_owned();
    html = H1.replace_all(&html, "<h1>$1</h1>").into_owned();

    html = BOLD.replace_all(&html, "<strong>$1</strong>").into_owned();
    html = ITALIC.replace_all(&html, "<em>$1</em>").into_owned();

    html = LIST_ITEM.replace_all(&html, "<li>$1</li>").into_owned();
    html = LIST_RUN
        .replace_all(&html, |caps: &Captures| {
            format!("<ul>{}</ul>\n", caps[0].trim_end())
        })
        .into_owned();

    let html = PARAGRAPH_BREAK
        .split(html.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(wrap_paragraph)
        .collect::<Vec<_>>()
        .join("\n");

    PLACEHOLDER
        .replace_all(&html, |caps: &Captures| {
            let index: usize = caps[2].parse().unwrap_or(usize::MAX);
            match &caps[1] {
                "BLOCK" => blocks.get(index).map_or_else(String::new, |b| {
                    if b.lang.is_empty() {
                        format!("<pre><code>{}</code></pre>", b.code)
                    } else {
                        format!(
                            "<pre><code class=\"language-{}\">{}</code></pre>",
                            b.lang, b.code
                        )
                    }
                }),
                _ => inline
                    .get(index)
                    .map_or_else(String::new, |c| format!("<code>{c}</code>")),
            }
        })
        .into_owned()
}

fn wrap_paragraph(block: &str) -> String {
    let is_block_level = block.starts_with("<h")
        || block.starts_with("<ul>")
        || (block.starts_with("\x00BLOCK") && block.ends_with('\x00') && !block.contains('\n'));
    if is_block_level {
        block.to_string()
    } else {
        format!("<p>{block}</p>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers() {
        assert_eq!(to_markup("# Title"), "<h1>Title</h1>");
        assert_eq!(to_markup("## Sub"), "<h2>Sub</h2>");
        assert_eq!(to_markup("### Small"), "<h3>Small</h3>");
    }

    #[test]
    fn test_paragraphs() {
        let html = to_markup("First para\n\nSecond para");
        assert_eq!(html, "<p>First para</p>\n<p>Second para</p>");
    }

    #[test]
    fn test_emphasis() {
        let html = to_markup("Some **bold** and *italic* text");
        assert_eq!(
            html,
            "<p>Some <strong>bold</strong> and <em>italic</em> text</p>"
        );
    }

    #[test]
    fn test_unordered_list() {
        let html = to_markup("# Points\n\n- one\n- two");
        assert_eq!(html, "<h1>Points</h1>\n<ul><li>one</li>\n<li>two</li></ul>");
    }

    #[test]
    fn test_code_is_not_rewritten() {
        let html = to_markup("```rust\nlet x = **not bold**;\n- not a list\n```");
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">let x = **not bold**;\n- not a list</code></pre>"
        );

        let html = to_markup("Use `*ptr*` here");
        assert_eq!(html, "<p>Use <code>*ptr*</code> here</p>");
    }

    #[test]
    fn test_html_is_escaped() {
        let html = to_markup("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(to_markup("   \n  "), "");
    }

    #[test]
    fn test_unbalanced_markers_pass_through() {
        assert_eq!(to_markup("2 * 3 = 6"), "<p>2 * 3 = 6</p>");
        assert_eq!(to_markup("stray ** marker"), "<p>stray ** marker</p>");
    }
}
