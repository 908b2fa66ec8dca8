//! Markdown syntax coloring for the editor backdrop.
//!
//! The output mirrors the input character for character (markers included)
//! wrapped in `<span class="md-*">` elements, so it can sit underneath a
//! transparent textarea without shifting the caret.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(-{3,}|_{3,}|\*{3,})$").unwrap());
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})([ \t]+)(.*)$").unwrap());
// Alternatives are ordered strictest first; one pass means a looser
// alternative can never re-wrap text a stricter one already claimed.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\*\*\*([^*\n]+)\*\*\*",
        r"|___([^_\n]+)___",
        r"|\*\*([^*\n]+)\*\*",
        r"|__([^_\n]+)__",
        r"|\*([^*\n]+)\*",
        r"|_([^_\n]+)_",
    ))
    .unwrap()
});
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~([^~\n]+)~~").unwrap());
static LINK_OR_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]\n]*)\]\(([^)\n]+)\)").unwrap());
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(&gt;.*)$").unwrap());
static UNORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)([-*+])([ \t])").unwrap());
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)(\d+\.)([ \t])").unwrap());
static INLINE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00INLINECODE(\d+)\x00").unwrap());
static BLOCK_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00CODEBLOCK(\d+)\x00").unwrap());

/// Escape HTML metacharacters. NUL bytes are dropped since they delimit
/// internal placeholders.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\0' => {}
            c => out.push(c),
        }
    }
    out
}

struct FencedBlock {
    lang: String,
    code: String,
}

/// Produce syntax-colored markup for a markdown buffer.
///
/// Never fails: unbalanced or unterminated markers simply don't match and
/// come through as escaped text.
pub fn highlight(text: &str) -> String {
    let mut html = escape_html(text);

    let mut blocks: Vec<FencedBlock> = Vec::new();
    html = CODE_BLOCK
        .replace_all(&html, |caps: &Captures| {
            blocks.push(FencedBlock {
                lang: caps[1].to_string(),
                code: caps[2].to_string(),
            });
            format!("\x00CODEBLOCK{}\x00", blocks.len() - 1)
        })
        .into_owned();

    let mut inline: Vec<String> = Vec::new();
    html = INLINE_CODE
        .replace_all(&html, |caps: &Captures| {
            inline.push(caps[1].to_string());
            format!("\x00INLINECODE{}\x00", inline.len() - 1)
        })
        .into_owned();

    // Horizontal rules go before list markers so `---` isn't read as a bullet.
    html = HORIZONTAL_RULE
        .replace_all(&html, r#"<span class="md-hr">$1</span>"#)
        .into_owned();

    html = HEADING
        .replace_all(
            &html,
            r#"<span class="md-heading-marker">$1</span>$2<span class="md-heading">$3</span>"#,
        )
        .into_owned();

    html = EMPHASIS
        .replace_all(&html, |caps: &Captures| {
            let (class, marker, inner) = if let Some(m) = caps.get(1) {
                ("md-bold-italic", "***", m.as_str())
            } else if let Some(m) = caps.get(2) {
                ("md-bold-italic", "___", m.as_str())
            } else if let Some(m) = caps.get(3) {
                ("md-bold", "**", m.as_str())
            } else if let Some(m) = caps.get(4) {
                ("md-bold", "__", m.as_str())
            } else if let Some(m) = caps.get(5) {
                ("md-italic", "*", m.as_str())
            } else if let Some(m) = caps.get(6) {
                ("md-italic", "_", m.as_str())
            } else {
                return caps[0].to_string();
            };
            format!(r#"<span class="{class}">{marker}{inner}{marker}</span>"#)
        })
        .into_owned();

    html = STRIKETHROUGH
        .replace_all(&html, r#"<span class="md-strikethrough">~~$1~~</span>"#)
        .into_owned();

    // Images and links share one pass so an image is never re-wrapped as a link.
    html = LINK_OR_IMAGE
        .replace_all(&html, |caps: &Captures| {
            let is_image = !caps[1].is_empty();
            let text = &caps[2];
            let url = &caps[3];
            if is_image {
                format!(
                    r#"<span class="md-image-marker">!</span>[<span class="md-link-text">{text}</span>](<span class="md-link-url">{url}</span>)"#
                )
            } else if text.is_empty() {
                caps[0].to_string()
            } else {
                format!(
                    r#"[<span class="md-link-text">{text}</span>](<span class="md-link-url">{url}</span>)"#
                )
            }
        })
        .into_owned();

    html = BLOCKQUOTE
        .replace_all(&html, r#"<span class="md-blockquote">$1</span>"#)
        .into_owned();

    html = UNORDERED_MARKER
        .replace_all(&html, r#"$1<span class="md-list-marker">$2</span>$3"#)
        .into_owned();
    html = ORDERED_MARKER
        .replace_all(&html, r#"$1<span class="md-list-marker">$2</span>$3"#)
        .into_owned();

    html = INLINE_PLACEHOLDER
        .replace_all(&html, |caps: &Captures| {
            let code = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| inline.get(i))
                .map_or("", String::as_str);
            format!(r#"<span class="md-code">`{code}`</span>"#)
        })
        .into_owned();

    BLOCK_PLACEHOLDER
        .replace_all(&html, |caps: &Captures| {
            let Some(block) = caps[1].parse::<usize>().ok().and_then(|i| blocks.get(i)) else {
                return String::new();
            };
            let lang = if block.lang.is_empty() {
                String::new()
            } else {
                format!(r#"<span class="md-code-lang">{}</span>"#, block.lang)
            };
            format!(
                r#"<span class="md-code-block">```{lang}
{}```</span>"#,
                block.code
            )
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Remove every tag the highlighter itself generates.
    fn strip_generated(html: &str) -> String {
        let tags = Regex::new(r#"<span class="md-[a-z-]+">|</span>"#).unwrap();
        tags.replace_all(html, "").into_owned()
    }

    #[test]
    fn test_escapes_html() {
        let out = highlight("<b>hi</b> & \"q\"");
        assert_eq!(out, "&lt;b&gt;hi&lt;/b&gt; &amp; &quot;q&quot;");
    }

    #[test]
    fn test_never_leaks_user_angle_brackets() {
        let inputs = [
            "<script>alert('x')</script>",
            "# <h1> heading",
            "**<em>** *<i>*",
            "```\n<div>\n```",
            "`<span>` and > quote",
            "[<a>](<b>) ![<img>](x)",
            "> <blockquote>",
            "- <li>",
        ];
        for input in inputs {
            let stripped = strip_generated(&highlight(input));
            assert!(
                !stripped.contains('<') && !stripped.contains('>'),
                "leaked markup for {input:?}: {stripped}"
            );
        }
    }

    #[test]
    fn test_output_preserves_text() {
        let input = "# Title\n\nSome **bold** and *it* and `code`\n\n- item\n1. first\n> quote";
        let stripped = strip_generated(&highlight(input));
        assert_eq!(stripped, escape_html(input));
    }

    #[test]
    fn test_heading() {
        assert_eq!(
            highlight("## Hello"),
            r#"<span class="md-heading-marker">##</span> <span class="md-heading">Hello</span>"#
        );
    }

    #[test]
    fn test_emphasis_order() {
        assert_eq!(
            highlight("***both***"),
            r#"<span class="md-bold-italic">***both***</span>"#
        );
        assert_eq!(highlight("**b**"), r#"<span class="md-bold">**b**</span>"#);
        assert_eq!(highlight("*i*"), r#"<span class="md-italic">*i*</span>"#);
        assert_eq!(highlight("__b__"), r#"<span class="md-bold">__b__</span>"#);
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(
            highlight("~~gone~~"),
            r#"<span class="md-strikethrough">~~gone~~</span>"#
        );
    }

    #[test]
    fn test_code_contents_not_recolored() {
        let out = highlight("```rust\nlet x = **y**;\n```");
        assert_eq!(
            out,
            "<span class=\"md-code-block\">```<span class=\"md-code-lang\">rust</span>\nlet x = **y**;\n```</span>"
        );

        let out = highlight("use `*ptr*` here");
        assert_eq!(out, r#"use <span class="md-code">`*ptr*`</span> here"#);
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            highlight("[text](http://x)"),
            r#"[<span class="md-link-text">text</span>](<span class="md-link-url">http://x</span>)"#
        );
        assert_eq!(
            highlight("![alt](pic.png)"),
            r#"<span class="md-image-marker">!</span>[<span class="md-link-text">alt</span>](<span class="md-link-url">pic.png</span>)"#
        );
    }

    #[test]
    fn test_rule_quote_and_lists() {
        assert_eq!(highlight("---"), r#"<span class="md-hr">---</span>"#);
        assert_eq!(
            highlight("> wise"),
            r#"<span class="md-blockquote">&gt; wise</span>"#
        );
        assert_eq!(
            highlight("  - item"),
            r#"  <span class="md-list-marker">-</span> item"#
        );
        assert_eq!(
            highlight("3. third"),
            r#"<span class="md-list-marker">3.</span> third"#
        );
    }

    #[test]
    fn test_unbalanced_markers_pass_through() {
        assert_eq!(highlight("a * b"), "a * b");
        assert_eq!(highlight("unclosed `tick"), "unclosed `tick");
        assert_eq!(highlight("```\nno end"), "```\nno end");
        assert_eq!(highlight("[broken](link"), "[broken](link");
    }

    #[test]
    fn test_nul_bytes_dropped() {
        assert_eq!(highlight("a\0CODEBLOCK0\0b"), "aCODEBLOCK0b");
    }
}
