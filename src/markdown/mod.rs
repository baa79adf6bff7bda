//! Markdown Module
//!
//! Converts the Markdown dialect used by blog and project content into HTML.
//!
//! The renderer is a fixed sequence of rewrite passes rather than a parser:
//! code, headings, emphasis, links and images, lists, paragraphs. It accepts
//! any input and degrades malformed Markdown into literal text. HTML outside
//! fenced code is passed through untouched; content is first-party.
//!
//! Rendering is not idempotent: feeding rendered HTML back in may wrap it
//! again.

mod pipeline;

pub use pipeline::escape_html;

use pipeline::CodeShield;

// == Markdown Renderer ==
/// Stateless Markdown renderer, handed to content modules that render
/// Markdown-flagged fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders `markdown` to HTML. See [`render`].
    pub fn render<'a>(&self, markdown: impl Into<Option<&'a str>>) -> String {
        render(markdown)
    }
}

// == Render ==
/// Renders `markdown` to HTML.
///
/// Absent or empty input yields an empty string.
///
/// ```
/// assert_eq!(folio::markdown::render("# Hi"), "<h1>Hi</h1>");
/// assert_eq!(folio::markdown::render(None), "");
/// ```
pub fn render<'a>(markdown: impl Into<Option<&'a str>>) -> String {
    let markdown = match markdown.into() {
        Some(text) if !text.is_empty() => text,
        _ => return String::new(),
    };

    let text = pipeline::strip_shield_markers(&markdown.replace("\r\n", "\n"));
    let mut shield = CodeShield::default();

    let html = pipeline::process_code(&text, &mut shield);
    let html = pipeline::process_headings(&html);
    let html = pipeline::process_emphasis(&html);
    let html = pipeline::process_links(&html);
    let html = pipeline::process_lists(&html);
    let html = pipeline::process_paragraphs(&html);

    shield.restore(&html)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(render(""), "");
        assert_eq!(render(None), "");
        assert_eq!(MarkdownRenderer::new().render(Some("")), "");
    }

    #[test]
    fn test_heading() {
        assert_eq!(render("# Hi"), "<h1>Hi</h1>");
    }

    #[test]
    fn test_bold_paragraph() {
        assert_eq!(render("**bold**"), "<p><strong>bold</strong></p>");
    }

    #[test]
    fn test_single_list() {
        let html = render("- a\n- b");

        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn test_fenced_code_escaped() {
        let html = render("```\n<script>\n```");

        assert!(!html.contains("<script>"));
        assert_eq!(html, "<pre><code>&lt;script&gt;</code></pre>");
    }

    #[test]
    fn test_code_with_blank_lines_stays_one_block() {
        let html = render("```python\n# comment\n\nx = a_b_c\n```");

        assert_eq!(
            html,
            "<pre><code class=\"language-python\"># comment\n\nx = a_b_c</code></pre>"
        );
    }

    #[test]
    fn test_inline_code_untouched_by_emphasis() {
        assert_eq!(
            render("Use `snake_case_name` here"),
            "<p>Use <code>snake_case_name</code> here</p>"
        );
    }

    #[test]
    fn test_full_document() {
        let source = "# Title\n\nIntro with *style* and [a link](https://x.dev).\n\n- one\n- two\n\n1. first\n2. second\n\n![pic](img/p.png)";
        let expected = "<h1>Title</h1>\n\n\
             <p>Intro with <em>style</em> and <a href=\"https://x.dev\">a link</a>.</p>\n\n\
             <ul><li>one</li><li>two</li></ul>\n\n\
             <ol><li>first</li><li>second</li></ol>\n\n\
             <p><img src=\"img/p.png\" alt=\"pic\"></p>";

        assert_eq!(render(source), expected);
    }

    #[test]
    fn test_heading_with_emphasis() {
        assert_eq!(render("## A **b**"), "<h2>A <strong>b</strong></h2>");
    }

    #[test]
    fn test_setext_document() {
        assert_eq!(
            render("Title\n=====\n\nBody"),
            "<h1>Title</h1>\n\n<p>Body</p>"
        );
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(render("# Hi\r\n\r\ntext"), "<h1>Hi</h1>\n\n<p>text</p>");
    }

    #[test]
    fn test_raw_html_passes_through() {
        assert_eq!(render("<em>raw</em>"), "<p><em>raw</em></p>");
        assert_eq!(render("<p>done</p>"), "<p>done</p>");
    }

    #[test]
    fn test_placeholder_text_in_input_is_inert() {
        let html = render("\u{1A}B0\u{1A} text\n\n```\ncode\n```");

        assert_eq!(html, "<p>B0 text</p>\n\n<pre><code>code</code></pre>");
        assert_eq!(html.matches("<pre>").count(), 1);
    }

    #[test]
    fn test_star_bullets() {
        assert_eq!(render("* a\n* b"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_not_idempotent() {
        let once = render("`*a*`");
        assert_eq!(once, "<p><code>*a*</code></p>");
        assert_eq!(render(once.as_str()), "<p><code><em>a</em></code></p>");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_render_is_total(input in "\\PC{0,200}") {
            let _ = render(input.as_str());
        }

        #[test]
        fn prop_plain_text_becomes_paragraph(words in "[a-z]{1,10}( [a-z]{1,10}){0,5}") {
            prop_assert_eq!(render(words.as_str()), format!("<p>{}</p>", words));
        }

        #[test]
        fn prop_fenced_code_is_escaped(body in "[a-z<>&\"']{1,40}") {
            let html = render(format!("```\n{}\n```", body).as_str());
            prop_assert_eq!(html, format!("<pre><code>{}</code></pre>", escape_html(&body)));
        }
    }
}
