//! Classed syntax highlighting for code segments.
//!
//! Output uses css classes rather than inline colours so the same markup works
//! under both the light and the dark stylesheet from [`crate::css`].

use std::sync::{Arc, LazyLock};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Prefix for every class syntect emits
pub const CSS_PREFIX: &str = "khanit-";

static DEFAULT_SYNTAX_SET: LazyLock<Arc<SyntaxSet>> =
    LazyLock::new(|| Arc::new(SyntaxSet::load_defaults_newlines()));

/// Shared copy of syntect's bundled syntaxes, loaded on first use
pub fn default_syntax_set() -> Arc<SyntaxSet> {
    DEFAULT_SYNTAX_SET.clone()
}

/// Look a fence language up by token (`rs`, `python`, `js`...), falling back to
/// plain text for unknown or missing tags.
pub fn find_syntax<'s>(syntax_set: &'s SyntaxSet, lang: Option<&str>) -> &'s SyntaxReference {
    lang.and_then(|lang| {
        syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| syntax_set.find_syntax_by_extension(lang))
    })
    .unwrap_or_else(|| syntax_set.find_syntax_plain_text())
}

/// Highlight `code` and append `<pre><code>` markup to `output`.
pub fn highlight(
    syntax_set: &SyntaxSet,
    lang: Option<&str>,
    code: &str,
    output: &mut String,
) -> Result<(), syntect::Error> {
    let syntax = find_syntax(syntax_set, lang);
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        syntax_set,
        ClassStyle::SpacedPrefixed { prefix: CSS_PREFIX },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    let highlighted = generator.finalize();

    output.push_str("<pre class=\"");
    output.push_str(CSS_PREFIX);
    output.push_str("code\"><code");
    if let Some(lang) = lang {
        output.push_str(" class=\"language-");
        let _ = pulldown_cmark_escape::escape_html(&mut *output, lang);
        output.push('"');
    }
    output.push('>');
    output.push_str(&highlighted);
    output.push_str("</code></pre>\n");
    Ok(())
}
