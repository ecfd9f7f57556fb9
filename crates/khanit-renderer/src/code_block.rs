//! Markup for a code segment: highlighted source plus a copy control.

use pulldown_cmark_escape::{FmtWriter, escape_html, escape_html_body_text};
use std::fmt::Write as _;
use std::sync::Arc;

#[cfg(feature = "syntax-highlighting")]
use syntect::parsing::SyntaxSet;

use crate::segment::DEFAULT_CODE_LANGUAGE;

const COPY_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="icon-copy"><rect x="9" y="9" width="13" height="13" rx="2" ry="2"></rect><path d="M5 15H4a2 2 0 0 1-2-2V4a2 2 0 0 1 2-2h9a2 2 0 0 1 2 2v1"></path></svg>"#;
const CHECK_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="icon-check" hidden><path d="M20 6L9 17l-5-5"></path></svg>"#;

#[derive(Debug, Clone)]
pub struct CodeRenderer {
    #[cfg(feature = "syntax-highlighting")]
    syntax_set: Arc<SyntaxSet>,
    #[cfg(not(feature = "syntax-highlighting"))]
    _syntax_set: Arc<()>,
}

impl Default for CodeRenderer {
    fn default() -> Self {
        Self {
            #[cfg(feature = "syntax-highlighting")]
            syntax_set: crate::code_pretty::default_syntax_set(),
            #[cfg(not(feature = "syntax-highlighting"))]
            _syntax_set: Arc::new(()),
        }
    }
}

impl CodeRenderer {
    #[cfg(feature = "syntax-highlighting")]
    pub fn with_syntax_set(syntax_set: Arc<SyntaxSet>) -> Self {
        Self { syntax_set }
    }

    /// Render one code segment.
    ///
    /// Highlighting failures fall back to escaped plain text; this never fails.
    pub fn render(&self, source: &str, language: &str) -> String {
        let lang = Some(language).filter(|l| !l.is_empty() && *l != DEFAULT_CODE_LANGUAGE);

        let mut out = String::new();
        out.push_str("<div class=\"code-block\" data-language=\"");
        let _ = escape_html(FmtWriter(&mut out), language);
        out.push_str("\">\n<button type=\"button\" class=\"copy-code\" aria-label=\"Copy code\" data-code=\"");
        let _ = escape_html(FmtWriter(&mut out), source);
        let _ = write!(out, "\">{COPY_ICON}{CHECK_ICON}</button>\n");

        match self.highlighted(lang, source) {
            Some(html) => out.push_str(&html),
            None => plain_block(&mut out, lang, source),
        }
        out.push_str("</div>\n");
        out
    }

    #[cfg(feature = "syntax-highlighting")]
    fn highlighted(&self, lang: Option<&str>, source: &str) -> Option<String> {
        let mut html = String::new();
        match crate::code_pretty::highlight(&self.syntax_set, lang, source, &mut html) {
            Ok(()) => Some(html),
            Err(err) => {
                tracing::debug!(error = %err, lang, "highlighting failed, using plain block");
                None
            }
        }
    }

    #[cfg(not(feature = "syntax-highlighting"))]
    fn highlighted(&self, _lang: Option<&str>, _source: &str) -> Option<String> {
        None
    }
}

fn plain_block(out: &mut String, lang: Option<&str>, source: &str) {
    match lang {
        Some(lang) => {
            out.push_str("<pre><code class=\"language-");
            let _ = escape_html(FmtWriter(&mut *out), lang);
            out.push_str("\">");
        }
        None => out.push_str("<pre><code>"),
    }
    let _ = escape_html_body_text(FmtWriter(&mut *out), source);
    out.push_str("</code></pre>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_control_carries_literal_source() {
        let html = CodeRenderer::default().render("if a < b && c {\n}", "rust");
        assert!(html.contains(r#"data-code="if a &lt; b &amp;&amp; c {"#));
        assert!(html.contains(r#"data-language="rust""#));
        assert!(html.contains("aria-label=\"Copy code\""));
    }

    #[test]
    fn text_language_renders_without_language_class() {
        let html = CodeRenderer::default().render("hello", DEFAULT_CODE_LANGUAGE);
        assert!(!html.contains("language-text"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn plain_block_escapes_source() {
        let mut out = String::new();
        plain_block(&mut out, Some("html"), "<p>");
        assert_eq!(out, "<pre><code class=\"language-html\">&lt;p&gt;</code></pre>\n");
    }
}
