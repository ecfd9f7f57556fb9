//! Khanit renderer
//!
//! Turns stored article bodies (markdown with embedded LaTeX and fenced code)
//! into html. The body is split into typed [`Segment`]s in one markdown pass;
//! math goes to MathML, code to classed syntax highlighting, and the rest is
//! inserted as is. Headings get anchor ids as they are written, and the same
//! ids feed the table of contents.
//!

pub mod clipboard;
pub mod code_block;
#[cfg(feature = "syntax-highlighting")]
pub mod code_pretty;
pub mod config;
pub mod css;
pub mod date;
pub mod error;
pub mod headings;
pub mod lexer;
pub mod math;
pub mod page;
pub mod pagination;
pub mod post;
pub mod segment;
pub mod share;
pub mod slug;
pub mod toc;
pub mod writer;

pub use config::RenderConfig;
pub use error::{ConfigError, HostError, RenderError};
pub use headings::{Heading, extract_headings, heading_id};
pub use page::ArticlePage;
pub use post::Post;
pub use segment::{Segment, Segmenter, markdown_to_html, segment};
