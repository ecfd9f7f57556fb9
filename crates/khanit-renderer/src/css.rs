//! Stylesheets for rendered articles.

use miette::IntoDiagnostic;

#[cfg(feature = "syntax-highlighting")]
use syntect::highlighting::{Theme, ThemeSet};
#[cfg(feature = "syntax-highlighting")]
use syntect::html::{ClassStyle, css_for_theme_with_class_style};

use crate::config::RenderConfig;

/// Selector that forces the dark palette regardless of the system setting
pub const DARK_THEME_SELECTOR: &str = "[data-theme=\"dark\"]";

pub fn generate_base_css() -> String {
    r#"/* Base */
:root {
    --color-text: #1f2937;
    --color-muted: #6b7280;
    --color-surface: #f9fafb;
    --color-border: #d1d5db;
    --color-primary: #2563eb;
}

@media (prefers-color-scheme: dark) {
    :root {
        --color-text: #e5e7eb;
        --color-muted: #9ca3af;
        --color-surface: #1f2937;
        --color-border: #4b5563;
        --color-primary: #60a5fa;
    }
}

[data-theme="dark"] {
    --color-text: #e5e7eb;
    --color-muted: #9ca3af;
    --color-surface: #1f2937;
    --color-border: #4b5563;
    --color-primary: #60a5fa;
}

.article {
    max-width: 56rem;
    margin: 0 auto;
    padding: 3rem 1rem;
    color: var(--color-text);
}

.article-meta {
    color: var(--color-muted);
    font-size: 0.875rem;
}

.article-meta .category {
    margin-right: 0.5rem;
    padding: 0.25rem 0.5rem;
    border-radius: 0.375rem;
    color: var(--color-primary);
    background: var(--color-surface);
}

.article-author, .author-box > h3 {
    display: flex;
    align-items: center;
    gap: 0.75rem;
}

.avatar {
    width: 3rem;
    height: 3rem;
    border-radius: 9999px;
    object-fit: cover;
}

.avatar-initial {
    display: inline-flex;
    align-items: center;
    justify-content: center;
    background: var(--color-border);
}

.author-bio {
    color: var(--color-muted);
    font-size: 0.875rem;
}

.featured-image img {
    width: 100%;
    height: auto;
    border-radius: 0.75rem;
}

.author-box {
    margin-top: 3rem;
    padding: 1.5rem;
    border-radius: 0.75rem;
    background: var(--color-surface);
}

.related-posts ul {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr));
    gap: 1.5rem;
    padding: 0;
    list-style: none;
}

.related-posts img {
    width: 100%;
    aspect-ratio: 3 / 2;
    object-fit: cover;
}

.blog-content h1, .blog-content h2, .blog-content h3 {
    scroll-margin-top: 5rem;
}

.blog-content a {
    color: var(--color-primary);
}

.content-error {
    padding: 1rem;
    border: 1px solid var(--color-border);
    border-radius: 0.5rem;
}

/* Table of contents */
.toc {
    margin: 1.5rem 0;
    padding: 1rem;
    border-radius: 0.5rem;
    background: var(--color-surface);
}

.toc-toggle {
    display: flex;
    justify-content: space-between;
    align-items: center;
    width: 100%;
    background: none;
    border: 0;
    color: inherit;
    cursor: pointer;
}

.toc-chevron {
    width: 1.25rem;
    height: 1.25rem;
    transition: transform 0.2s;
}

.toc-toggle.open .toc-chevron {
    transform: rotate(180deg);
}

.toc-nav ul {
    list-style: none;
    padding-left: 1rem;
}

.toc-nav .ml-4 { margin-left: 1rem; }
.toc-nav .ml-8 { margin-left: 2rem; }

.toc-nav a.active {
    color: var(--color-primary);
    font-weight: 600;
}

/* Math */
.math-display {
    overflow-x: auto;
    margin: 1rem 0;
    text-align: center;
}

.math-error code {
    color: #dc2626;
}

/* Code blocks */
.code-block {
    position: relative;
    margin: 1rem 0;
}

.code-block pre {
    overflow-x: auto;
    padding: 1rem;
    border-radius: 0.5rem;
}

.copy-code {
    position: absolute;
    top: 0.5rem;
    right: 0.5rem;
    width: 2rem;
    height: 2rem;
    padding: 0.375rem;
    border: 0;
    border-radius: 0.375rem;
    background: var(--color-surface);
    color: var(--color-muted);
    cursor: pointer;
}

.copy-code.copied {
    color: #16a34a;
}

/* Share bar */
.share-bar {
    display: flex;
    flex-wrap: wrap;
    align-items: center;
    gap: 0.5rem;
    margin: 2rem 0;
}

.share-button {
    display: inline-flex;
    padding: 0.5rem;
    border: 0;
    border-radius: 9999px;
    background: var(--color-surface);
    color: var(--color-muted);
    cursor: pointer;
}

.tags {
    display: flex;
    flex-wrap: wrap;
    gap: 0.5rem;
    list-style: none;
}
"#
    .to_string()
}

#[cfg(feature = "syntax-highlighting")]
fn find_theme<'t>(themes: &'t ThemeSet, name: &str) -> miette::Result<&'t Theme> {
    themes.themes.get(name).ok_or_else(|| {
        let mut known: Vec<_> = themes.themes.keys().map(String::as_str).collect();
        known.sort_unstable();
        miette::miette!(
            help = format!("available themes: {}", known.join(", ")),
            "unknown code theme `{name}`"
        )
    })
}

/// Prefix every selector in a syntect stylesheet with `scope`.
fn scope_selectors(css: &str, scope: &str) -> String {
    let mut out = String::with_capacity(css.len());
    for line in css.lines() {
        let trimmed = line.trim_end();
        if let Some(selectors) = trimmed.strip_suffix('{')
            && selectors.trim_start().starts_with('.')
        {
            let scoped: Vec<String> = selectors
                .split(',')
                .map(|s| format!("{scope} {}", s.trim()))
                .collect();
            out.push_str(&scoped.join(", "));
            out.push_str(" {");
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Syntax colours for both palettes. The light theme is the default, the dark
/// one applies under `prefers-color-scheme: dark` and under
/// [`DARK_THEME_SELECTOR`].
#[cfg(feature = "syntax-highlighting")]
pub fn generate_syntax_css(light_theme: &str, dark_theme: &str) -> miette::Result<String> {
    let themes = ThemeSet::load_defaults();
    let style = || ClassStyle::SpacedPrefixed {
        prefix: crate::code_pretty::CSS_PREFIX,
    };
    let light_css =
        css_for_theme_with_class_style(find_theme(&themes, light_theme)?, style()).into_diagnostic()?;
    let dark_css =
        css_for_theme_with_class_style(find_theme(&themes, dark_theme)?, style()).into_diagnostic()?;

    let mut result = String::new();
    result.push_str("/* Syntax highlighting - Light Mode (default) */\n");
    result.push_str(&light_css);
    result.push_str("\n/* Syntax highlighting - Dark Mode */\n");
    result.push_str("@media (prefers-color-scheme: dark) {\n");
    result.push_str(&dark_css);
    result.push_str("}\n\n");
    result.push_str(&scope_selectors(&dark_css, DARK_THEME_SELECTOR));
    Ok(result)
}

#[cfg(not(feature = "syntax-highlighting"))]
pub fn generate_syntax_css(_light_theme: &str, _dark_theme: &str) -> miette::Result<String> {
    Ok(String::new())
}

/// Full stylesheet for an article page
pub fn generate_css(config: &RenderConfig) -> miette::Result<String> {
    let mut css = generate_base_css();
    css.push('\n');
    css.push_str(&generate_syntax_css(
        &config.light_code_theme,
        &config.dark_code_theme,
    )?);
    Ok(css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_each_selector() {
        let css = "/* theme */\n.khanit-code {\n color: #fff;\n}\n.khanit-a, .khanit-b .khanit-c {\n color: red;\n}\n";
        insta::assert_snapshot!(scope_selectors(css, DARK_THEME_SELECTOR), @r#"
        /* theme */
        [data-theme="dark"] .khanit-code {
         color: #fff;
        }
        [data-theme="dark"] .khanit-a, [data-theme="dark"] .khanit-b .khanit-c {
         color: red;
        }
        "#);
    }

    #[cfg(feature = "syntax-highlighting")]
    #[test]
    fn syntax_css_covers_both_palettes() {
        let css = generate_syntax_css("InspiredGitHub", "base16-ocean.dark").unwrap();
        assert!(css.contains(".khanit-code"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
        assert!(css.contains("[data-theme=\"dark\"] .khanit-code"));
    }

    #[cfg(feature = "syntax-highlighting")]
    #[test]
    fn unknown_theme_is_an_error() {
        let err = generate_syntax_css("no-such-theme", "base16-ocean.dark").unwrap_err();
        assert!(err.to_string().contains("no-such-theme"));
    }

    #[test]
    fn full_stylesheet_includes_base_rules() {
        let css = generate_css(&RenderConfig::default()).unwrap();
        assert!(css.contains(".toc-nav a.active"));
        assert!(css.contains(".copy-code"));
    }
}
