//! Math segments as MathML.
//!
//! Expressions go through pulldown-latex. Whatever happens, the reader gets
//! the container the stylesheet targets (`span.math-inline` or
//! `div.math-display`); an expression that doesn't parse is shown inside it
//! as written, with the parser's complaint in a `title`.

use pulldown_cmark_escape::escape_html;
use pulldown_latex::{
    Parser, Storage,
    config::{DisplayMode, RenderConfig},
    mathml::push_mathml,
};

/// Inline `$...$` or display `$$...$$`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathStyle {
    Inline,
    Display,
}

impl MathStyle {
    pub fn from_display(display: bool) -> Self {
        if display {
            MathStyle::Display
        } else {
            MathStyle::Inline
        }
    }

    fn class(self) -> &'static str {
        match self {
            MathStyle::Inline => "math-inline",
            MathStyle::Display => "math-display",
        }
    }

    fn element(self) -> &'static str {
        match self {
            MathStyle::Inline => "span",
            MathStyle::Display => "div",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathResult {
    Success(String),
    /// `html` shows the source as written; `message` is what the parser said
    Error { html: String, message: String },
}

impl MathResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MathResult::Success(_))
    }

    pub fn into_html(self) -> String {
        match self {
            MathResult::Success(mathml) | MathResult::Error { html: mathml, .. } => mathml,
        }
    }
}

fn latex_to_mathml(latex: &str, style: MathStyle) -> Result<String, String> {
    let storage = Storage::new();
    let events: Vec<_> = Parser::new(latex, &storage).collect();
    let problems: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err())
        .map(ToString::to_string)
        .collect();
    if !problems.is_empty() {
        return Err(problems.join("; "));
    }

    let config = RenderConfig {
        display_mode: match style {
            MathStyle::Inline => DisplayMode::Inline,
            MathStyle::Display => DisplayMode::Block,
        },
        ..Default::default()
    };
    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config).map_err(|err| err.to_string())?;
    Ok(mathml)
}

/// LaTeX to bare MathML. Never fails; see [`MathResult::Error`].
pub fn render_math(latex: &str, display: bool) -> MathResult {
    let style = MathStyle::from_display(display);
    match latex_to_mathml(latex, style) {
        Ok(mathml) => MathResult::Success(mathml),
        Err(message) => {
            tracing::debug!(%message, latex, "latex not rendered, showing source");
            MathResult::Error {
                html: source_as_written(latex, &message, style),
                message,
            }
        }
    }
}

fn source_as_written(latex: &str, message: &str, style: MathStyle) -> String {
    let mut html = format!("<span class=\"math math-error {}\" title=\"", style.class());
    let _ = escape_html(&mut html, message);
    html.push_str("\"><code>");
    let _ = escape_html(&mut html, latex);
    html.push_str("</code></span>");
    html
}

/// A `Math` segment as page markup.
pub fn render_math_segment(latex: &str, display: bool) -> String {
    let style = MathStyle::from_display(display);
    let element = style.element();
    let inner = render_math(latex, display).into_html();
    let mut html = format!("<{element} class=\"math {}\">{inner}</{element}>", style.class());
    if style == MathStyle::Display {
        html.push('\n');
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_expression_becomes_mathml() {
        let result = render_math("x^2", false);
        assert!(result.is_success());
        let mathml = result.into_html();
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("</math>"));
    }

    #[test]
    fn display_fraction() {
        let mathml = render_math(r"\frac{a}{b}", true).into_html();
        assert!(mathml.contains("<mfrac"));
    }

    #[test]
    fn thin_space_is_supported() {
        assert!(render_math(r"\int_0^1 x\,dx", true).is_success());
    }

    #[test]
    fn unclosed_brace_shows_source() {
        match render_math(r"\frac{a", false) {
            MathResult::Error { html, message } => {
                assert!(html.starts_with("<span class=\"math math-error math-inline\" title=\""));
                assert!(html.ends_with(r"<code>\frac{a</code></span>"));
                assert!(!message.is_empty());
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn source_is_escaped() {
        let html = render_math(r"\frac{<b>", true).into_html();
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn failed_segment_keeps_its_container() {
        let html = render_math_segment(r"\frac{a", true);
        assert!(html.starts_with("<div class=\"math math-display\"><span class=\"math math-error math-display\""));
        assert!(html.ends_with("</span></div>\n"));
    }

    #[test]
    fn containers_follow_style() {
        assert!(render_math_segment("x", false).starts_with("<span class=\"math math-inline\"><math"));
        assert!(render_math_segment("x", false).ends_with("</span>"));
        assert!(render_math_segment("x", true).starts_with("<div class=\"math math-display\"><math"));
    }
}
