//! Error types for the khanit renderer

use miette::Diagnostic;

/// Errors from turning an article body into segments.
///
/// None of these reach the reader of a page: [`crate::page::ArticlePage`]
/// replaces the body with a fixed message when segmentation fails.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum RenderError {
    /// The html writer failed partway through the document
    #[error("markdown transform failed")]
    #[diagnostic(code(khanit::render::transform))]
    Transform(#[from] std::fmt::Error),

    /// The transform ran to completion but produced nothing
    #[error("markdown transform produced no output")]
    #[diagnostic(
        code(khanit::render::empty),
        help("the document body is empty or contains only markup that renders to nothing")
    )]
    EmptyOutput,
}

/// Errors from loading a [`crate::config::RenderConfig`]
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(code(khanit::config::parse), help("check the config file for KDL syntax errors"))]
    Parse(#[from] kdl::KdlError),

    #[error("config node `{node}` expects {expected}")]
    #[diagnostic(code(khanit::config::value))]
    InvalidValue {
        node: &'static str,
        expected: &'static str,
    },

    #[error("config node `{node}` is not a valid url")]
    #[diagnostic(code(khanit::config::url))]
    InvalidUrl {
        node: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Errors surfaced by host capabilities (clipboard, native share sheet).
///
/// Callers in this crate log these and carry on; they never fail a render.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum HostError {
    #[error("clipboard unavailable: {0}")]
    #[diagnostic(code(khanit::host::clipboard))]
    Clipboard(String),

    #[error("share cancelled")]
    #[diagnostic(code(khanit::host::share_cancelled))]
    ShareCancelled,

    #[error("share failed: {0}")]
    #[diagnostic(code(khanit::host::share))]
    Share(String),
}
