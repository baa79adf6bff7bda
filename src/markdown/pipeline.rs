//! Markdown Pipeline
//!
//! The individual rewrite stages, applied in order by [`super::render`].
//! Each stage is a plain string-to-string pass; code produced by the first
//! stage is swapped out for opaque tokens until the very end so no later
//! stage can rewrite it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// == Patterns ==
static FENCED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([a-z]*)\n(.*?)\n```").expect("Failed to compile fenced code regex")
});
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("Failed to compile inline code regex"));

static ATX_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)$").expect("Failed to compile heading regex")
});
static SETEXT_H1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(.+)\n=+$").expect("Failed to compile setext regex"));
static SETEXT_H2: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(.+)\n-+$").expect("Failed to compile setext regex"));

static STRONG_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("Failed to compile emphasis regex"));
static STRONG_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__([^_]+)__").expect("Failed to compile emphasis regex"));
static EM_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("Failed to compile emphasis regex"));
static EM_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([^_]+)_").expect("Failed to compile emphasis regex"));

static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("Failed to compile image regex")
});
static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Failed to compile link regex")
});
static AUTOLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(https?://[^>]+)>").expect("Failed to compile autolink regex"));

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*[-*+]\s+)(.*)$").expect("Failed to compile list regex"));
static UNORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.+)$").expect("Failed to compile list regex"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\.\s+(.+)$").expect("Failed to compile list regex"));

static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("Failed to compile paragraph regex"));

// == Code Shield ==
/// Delimits stashed code tokens. Stripped from input before rendering.
const SHIELD: char = '\u{1A}';

static SHIELD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new("\u{1A}[BI](\\d+)\u{1A}").expect("Failed to compile shield regex"));

/// Holds rendered code while the remaining stages run.
#[derive(Debug, Default)]
pub(crate) struct CodeShield {
    stashed: Vec<String>,
}

impl CodeShield {
    fn stash(&mut self, kind: char, html: String) -> String {
        self.stashed.push(html);
        format!("{SHIELD}{kind}{}{SHIELD}", self.stashed.len() - 1)
    }

    /// Puts the stashed HTML back in place of its tokens.
    pub fn restore(&self, text: &str) -> String {
        SHIELD_TOKEN
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.stashed.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Removes shield delimiters so input text cannot forge a code token.
pub(crate) fn strip_shield_markers(text: &str) -> String {
    text.replace(SHIELD, "")
}

/// Returns true if `block` starts with a stashed fenced code block.
fn starts_with_block_token(block: &str) -> bool {
    let mut chars = block.chars();
    chars.next() == Some(SHIELD) && chars.next() == Some('B')
}

// == Stage 1: Code ==
/// Renders fenced blocks and inline code spans into the shield.
///
/// Fenced code is trimmed and escaped and gets a `language-*` class when the
/// fence names one. Inline code is reproduced unescaped.
pub(crate) fn process_code(text: &str, shield: &mut CodeShield) -> String {
    let text = FENCED_CODE.replace_all(text, |caps: &Captures| {
        let class = match &caps[1] {
            "" => String::new(),
            language => format!(" class=\"language-{}\"", language),
        };
        let html = format!(
            "<pre><code{}>{}</code></pre>",
            class,
            escape_html(caps[2].trim())
        );
        shield.stash('B', html)
    });

    INLINE_CODE
        .replace_all(&text, |caps: &Captures| {
            shield.stash('I', format!("<code>{}</code>", &caps[1]))
        })
        .into_owned()
}

// == Stage 2: Headings ==
pub(crate) fn process_headings(text: &str) -> String {
    let text = ATX_HEADING.replace_all(text, |caps: &Captures| {
        let level = caps[1].len();
        format!("<h{level}>{}</h{level}>", caps[2].trim())
    });
    let text = SETEXT_H1.replace_all(&text, "<h1>${1}</h1>");
    SETEXT_H2.replace_all(&text, "<h2>${1}</h2>").into_owned()
}

// == Stage 3: Emphasis ==
/// Applies strong/em replacement line by line.
///
/// On list lines only the item text is touched, so `*` bullets survive for
/// the list stage.
pub(crate) fn process_emphasis(text: &str) -> String {
    text.split('\n')
        .map(|line| match LIST_MARKER.captures(line) {
            Some(caps) => format!("{}{}", &caps[1], emphasize(&caps[2])),
            None => emphasize(line),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn emphasize(line: &str) -> String {
    let line = STRONG_STAR.replace_all(line, "<strong>${1}</strong>");
    let line = STRONG_UNDERSCORE.replace_all(&line, "<strong>${1}</strong>");
    let line = EM_STAR.replace_all(&line, "<em>${1}</em>");
    EM_UNDERSCORE.replace_all(&line, "<em>${1}</em>").into_owned()
}

// == Stage 4: Links and Images ==
/// Images go first: the plain link pattern would otherwise eat `![alt](url)`.
pub(crate) fn process_links(text: &str) -> String {
    let text = IMAGE.replace_all(text, r#"<img src="${2}" alt="${1}">"#);
    let text = LINK.replace_all(&text, r#"<a href="${2}">${1}</a>"#);
    AUTOLINK
        .replace_all(&text, r#"<a href="${1}">${1}</a>"#)
        .into_owned()
}

// == Stage 5: Lists ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug)]
struct ListRun {
    kind: ListKind,
    items: Vec<String>,
}

impl ListRun {
    fn into_html(self) -> String {
        let tag = match self.kind {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        };
        let items: String = self
            .items
            .iter()
            .map(|item| format!("<li>{}</li>", item))
            .collect();
        format!("<{tag}>{items}</{tag}>")
    }
}

fn list_item(line: &str) -> Option<(ListKind, String)> {
    if let Some(caps) = UNORDERED_ITEM.captures(line) {
        return Some((ListKind::Unordered, caps[1].to_string()));
    }
    ORDERED_ITEM
        .captures(line)
        .map(|caps| (ListKind::Ordered, caps[1].to_string()))
}

/// Collapses each contiguous run of same-kind list lines into one list.
///
/// Indentation is ignored, so nested items flatten into their parent run.
pub(crate) fn process_lists(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run: Option<ListRun> = None;

    for line in text.split('\n') {
        match list_item(line) {
            Some((kind, item)) => match run.as_mut() {
                Some(current) if current.kind == kind => current.items.push(item),
                _ => {
                    if let Some(done) = run.take() {
                        lines.push(done.into_html());
                    }
                    run = Some(ListRun {
                        kind,
                        items: vec![item],
                    });
                }
            },
            None => {
                if let Some(done) = run.take() {
                    lines.push(done.into_html());
                }
                lines.push(line.to_string());
            }
        }
    }
    if let Some(done) = run {
        lines.push(done.into_html());
    }

    lines.join("\n")
}

// == Stage 6: Paragraphs ==
const BLOCK_PREFIXES: [&str; 5] = ["<h", "<ul", "<ol", "<pre", "<p"];

/// Wraps every blank-line-separated block that is not already block-level
/// HTML in `<p>`.
pub(crate) fn process_paragraphs(text: &str) -> String {
    BLANK_LINE
        .split(text)
        .map(|block| {
            let trimmed = block.trim();
            let is_block_html = trimmed.is_empty()
                || starts_with_block_token(trimmed)
                || BLOCK_PREFIXES.iter().any(|tag| trimmed.starts_with(tag));

            if is_block_html {
                block.to_string()
            } else {
                format!("<p>{}</p>", trimmed)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// == Escaping ==
/// Escapes the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn code(text: &str) -> String {
        let mut shield = CodeShield::default();
        let out = process_code(text, &mut shield);
        shield.restore(&out)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_fenced_code_with_language() {
        assert_eq!(
            code("```rust\nlet ok = 1 < 2;\n```"),
            "<pre><code class=\"language-rust\">let ok = 1 &lt; 2;</code></pre>"
        );
    }

    #[test]
    fn test_fenced_code_is_trimmed() {
        assert_eq!(code("```\n\n  x\n\n```"), "<pre><code>x</code></pre>");
    }

    #[test]
    fn test_inline_code_not_escaped() {
        assert_eq!(code("a `<b>` c"), "a <code><b></code> c");
    }

    #[test]
    fn test_shield_hides_code_from_later_stages() {
        let mut shield = CodeShield::default();
        let out = process_code("```\n# not_a *heading*\n```", &mut shield);

        assert!(!out.contains('#'));
        assert_eq!(process_emphasis(&process_headings(&out)), out);
    }

    #[test]
    fn test_restore_leaves_unknown_tokens() {
        let shield = CodeShield::default();
        let forged = "\u{1A}B7\u{1A}";
        assert_eq!(shield.restore(forged), forged);
    }

    #[test]
    fn test_atx_headings() {
        assert_eq!(process_headings("# One"), "<h1>One</h1>");
        assert_eq!(process_headings("###### Six  "), "<h6>Six</h6>");
        assert_eq!(process_headings("####### Seven"), "####### Seven");
        assert_eq!(process_headings("#NoSpace"), "#NoSpace");
    }

    #[test]
    fn test_setext_headings() {
        assert_eq!(process_headings("Title\n====="), "<h1>Title</h1>");
        assert_eq!(process_headings("Sub\n---"), "<h2>Sub</h2>");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(process_emphasis("**a** and __b__"), "<strong>a</strong> and <strong>b</strong>");
        assert_eq!(process_emphasis("*a* and _b_"), "<em>a</em> and <em>b</em>");
    }

    #[test]
    fn test_emphasis_keeps_star_bullets() {
        assert_eq!(process_emphasis("* one *x*\n* two"), "* one <em>x</em>\n* two");
    }

    #[test]
    fn test_unclosed_emphasis_is_literal() {
        assert_eq!(process_emphasis("2 * 3"), "2 * 3");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            process_links("[site](https://x.dev)"),
            r#"<a href="https://x.dev">site</a>"#
        );
        assert_eq!(
            process_links("![me](img/me.png)"),
            r#"<img src="img/me.png" alt="me">"#
        );
        assert_eq!(
            process_links("<https://x.dev>"),
            r#"<a href="https://x.dev">https://x.dev</a>"#
        );
    }

    #[test]
    fn test_lists_group_contiguous_runs() {
        assert_eq!(
            process_lists("- a\n* b\n+ c"),
            "<ul><li>a</li><li>b</li><li>c</li></ul>"
        );
        assert_eq!(
            process_lists("1. one\n2. two"),
            "<ol><li>one</li><li>two</li></ol>"
        );
    }

    #[test]
    fn test_lists_split_on_blank_and_kind_change() {
        assert_eq!(
            process_lists("- a\n\n- b"),
            "<ul><li>a</li></ul>\n\n<ul><li>b</li></ul>"
        );
        assert_eq!(
            process_lists("- a\n1. b"),
            "<ul><li>a</li></ul>\n<ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_nested_items_flatten() {
        assert_eq!(
            process_lists("- a\n  - b"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(process_paragraphs("one\n\n  two  "), "<p>one</p>\n\n<p>two</p>");
        assert_eq!(process_paragraphs("<h1>x</h1>"), "<h1>x</h1>");
        assert_eq!(process_paragraphs("<p>kept</p>"), "<p>kept</p>");
        assert_eq!(process_paragraphs("<div>x</div>"), "<p><div>x</div></p>");
    }
}
