//! Splitting an article body into independently rendered segments.
//!
//! Math spans and code blocks are recognised by the markdown tokenizer itself,
//! in the same pass that produces the block html, so prose and code can never
//! be confused with each other. See [`crate::writer`] for the html side and
//! [`crate::lexer`] for the math styles the tokenizer doesn't accept alone.

use pulldown_cmark::{Options, Parser};
use serde::{Deserialize, Serialize};

use crate::RenderError;
use crate::lexer::bridge_display_blocks;
use crate::writer::{SegmentWriter, WriteMode};

/// Language tag for code blocks that don't declare one
pub const DEFAULT_CODE_LANGUAGE: &str = "text";

/// One independently renderable run of an article.
///
/// Segments are produced in document order. Rendering each one and
/// concatenating the results gives the article in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    /// Already-resolved block html
    Html { markup: String },
    /// A LaTeX expression, `display` for `$$...$$`
    Math { expression: String, display: bool },
    /// A code block and its language tag
    Code { source: String, language: String },
}

impl Segment {
    pub fn is_html(&self) -> bool {
        matches!(self, Segment::Html { .. })
    }
}

pub fn default_md_options() -> Options {
    Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TABLES
        | Options::ENABLE_GFM
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
}

/// Splits documents into [`Segment`]s.
///
/// Holds no state between calls; callers that want caching own it.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    md_options: Options,
    hard_breaks: bool,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            md_options: default_md_options(),
            hard_breaks: true,
        }
    }
}

impl Segmenter {
    pub fn new(md_options: Options, hard_breaks: bool) -> Self {
        Self {
            md_options,
            hard_breaks,
        }
    }

    /// Whether single newlines inside a paragraph become `<br />`
    pub fn with_hard_breaks(mut self, hard_breaks: bool) -> Self {
        self.hard_breaks = hard_breaks;
        self
    }

    fn write(&self, document: &str, mode: WriteMode) -> Result<Vec<Segment>, RenderError> {
        let source = bridge_display_blocks(document);
        let events: Vec<_> = Parser::new_ext(&source, self.md_options)
            .into_offset_iter()
            .collect();
        let segments = SegmentWriter::new(&source, events, mode)
            .hard_breaks(self.hard_breaks)
            .run()?;
        if segments.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(segments)
    }

    /// Segment a document. Math and code come out as their own segments,
    /// everything else as html between them.
    #[tracing::instrument(level = "debug", skip_all, fields(len = document.len()))]
    pub fn segment(&self, document: &str) -> Result<Vec<Segment>, RenderError> {
        let segments = self.write(document, WriteMode::Segmented)?;
        tracing::debug!(count = segments.len(), "segmented document");
        Ok(segments)
    }

    /// The plain markdown transform, with math and code left inline.
    pub fn to_html(&self, document: &str) -> Result<String, RenderError> {
        let segments = self.write(document, WriteMode::Inline)?;
        Ok(segments
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Html { markup } => Some(markup),
                _ => None,
            })
            .collect())
    }
}

/// Segment a document with the default options.
pub fn segment(document: &str) -> Result<Vec<Segment>, RenderError> {
    Segmenter::default().segment(document)
}

/// Markdown to html with the default options and no segmentation.
pub fn markdown_to_html(document: &str) -> Result<String, RenderError> {
    Segmenter::default().to_html(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(markup: &str) -> Segment {
        Segment::Html {
            markup: markup.to_string(),
        }
    }

    #[test]
    fn plain_document_is_one_html_segment() {
        let doc = "# Title\n\nSome *emphasis* and a [link](https://example.com).\n\n- one\n- two";
        let segments = segment(doc).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], html(&markdown_to_html(doc).unwrap()));
    }

    #[test]
    fn inline_math_splits_paragraph() {
        let segments = segment("before $x^2$ after").unwrap();
        assert_eq!(
            segments,
            vec![
                html("<p>before "),
                Segment::Math {
                    expression: "x^2".into(),
                    display: false
                },
                html(" after</p>\n"),
            ]
        );
    }

    #[test]
    fn display_math_keeps_expression_verbatim() {
        let segments = segment(r"$$\int_0^1 x\,dx$$").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Math {
                expression: r"\int_0^1 x\,dx".into(),
                display: true
            }]
        );
    }

    #[test]
    fn display_math_between_paragraphs() {
        let segments = segment("Area:\n\n$$\\pi r^2$$\n\nDone.").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], html("<p>Area:</p>\n"));
        assert!(matches!(&segments[1], Segment::Math { display: true, .. }));
        assert_eq!(segments[2], html("<p>Done.</p>\n"));
    }

    #[test]
    fn fenced_code_becomes_code_segment() {
        let doc = "Intro\n\n```python\nprint(1)\n```\n\nOutro";
        let segments = segment(doc).unwrap();
        assert_eq!(
            segments,
            vec![
                html("<p>Intro</p>\n"),
                Segment::Code {
                    source: "print(1)".into(),
                    language: "python".into()
                },
                html("<p>Outro</p>\n"),
            ]
        );
    }

    #[test]
    fn code_without_language_is_text() {
        let segments = segment("```\nplain\n```").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Code {
                source: "plain".into(),
                language: DEFAULT_CODE_LANGUAGE.into()
            }]
        );
    }

    #[test]
    fn dollars_inside_code_stay_in_code() {
        let doc = "```bash\necho $HOME $PATH\n```";
        let segments = segment(doc).unwrap();
        assert_eq!(segments.len(), 1);
        match &segments[0] {
            Segment::Code { source, language } => {
                assert_eq!(source, "echo $HOME $PATH");
                assert_eq!(language, "bash");
            }
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_dollar_stays_literal() {
        let segments = segment("costs $5 today").unwrap();
        assert_eq!(segments, vec![html("<p>costs $5 today</p>\n")]);
        assert!(!segments.iter().any(|s| matches!(s, Segment::Math { .. })));
    }

    #[test]
    fn padded_inline_math_is_math() {
        let segments = segment("ค่า $ x + y $ คือ").unwrap();
        assert_eq!(
            segments,
            vec![
                html("<p>ค่า "),
                Segment::Math {
                    expression: "x + y".into(),
                    display: false
                },
                html(" คือ</p>\n"),
            ]
        );
    }

    #[test]
    fn padded_and_tight_math_in_one_paragraph() {
        let segments = segment("$ a $ then $b$").unwrap();
        let expressions: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Math { expression, .. } => Some(expression.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(expressions, ["a", "b"]);
    }

    #[test]
    fn prices_are_not_math() {
        let segments = segment("from $5 and $10, or $ 5 to $10").unwrap();
        assert_eq!(
            segments,
            vec![html("<p>from $5 and $10, or $ 5 to $10</p>\n")]
        );
    }

    #[test]
    fn escaped_dollars_stay_literal() {
        let segments = segment(r"pay \$ 5 now and \$ 6 later").unwrap();
        assert_eq!(
            segments,
            vec![html("<p>pay $ 5 now and $ 6 later</p>\n")]
        );
    }

    #[test]
    fn display_block_with_blank_line_stays_whole() {
        let doc = "ก่อน\n\n$$\n\\begin{aligned}\na &= 1 \\\\\n\nb &= 2\n\\end{aligned}\n$$\n\nหลัง\n";
        let segments = segment(doc).unwrap();
        assert_eq!(
            segments,
            vec![
                html("<p>ก่อน</p>\n"),
                Segment::Math {
                    expression: "\\begin{aligned}\na &= 1 \\\\\n\nb &= 2\n\\end{aligned}".into(),
                    display: true
                },
                html("<p>หลัง</p>\n"),
            ]
        );
    }

    #[test]
    fn padded_math_in_plain_transform() {
        assert_eq!(
            markdown_to_html("a $ x $ b").unwrap(),
            "<p>a <span class=\"math math-inline\">x</span> b</p>\n"
        );
    }

    #[test]
    fn segmentation_is_repeatable() {
        let doc = "# T\n\n$a$ and $$b$$\n\n```rust\nfn main() {}\n```\n";
        assert_eq!(segment(doc).unwrap(), segment(doc).unwrap());
    }

    #[test]
    fn headings_carry_anchor_ids() {
        let segments = segment("## ทฤษฎีความน่าจะเป็น\n\n#### Deep").unwrap();
        assert_eq!(
            segments,
            vec![html(
                "<h2 id=\"ทฤษฎีความน่าจะเป็น\">ทฤษฎีความน่าจะเป็น</h2>\n<h4>Deep</h4>\n"
            )]
        );
    }

    #[test]
    fn setext_heading_uses_rendered_text() {
        let out = markdown_to_html("Big *Title*\n===").unwrap();
        assert_eq!(out, "<h1 id=\"big-title\">Big <em>Title</em></h1>\n");
    }

    #[test]
    fn soft_breaks_follow_option() {
        let doc = "line one\nline two";
        assert_eq!(
            markdown_to_html(doc).unwrap(),
            "<p>line one<br />\nline two</p>\n"
        );
        let soft = Segmenter::default().with_hard_breaks(false);
        assert_eq!(soft.to_html(doc).unwrap(), "<p>line one\nline two</p>\n");
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(matches!(segment(""), Err(RenderError::EmptyOutput)));
        assert!(matches!(segment("   \n\n"), Err(RenderError::EmptyOutput)));
    }

    #[test]
    fn math_in_table_keeps_table_state() {
        let doc = "| a | b |\n|---|---|\n| $x$ | y |";
        let segments = segment(doc).unwrap();
        let joined: String = segments
            .iter()
            .map(|s| match s {
                Segment::Html { markup } => markup.clone(),
                Segment::Math { expression, .. } => format!("[{expression}]"),
                Segment::Code { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(
            joined,
            "<table><thead><tr><th>a</th><th>b</th></tr></thead><tbody>\n<tr><td>[x]</td><td>y</td></tr>\n</tbody></table>\n"
        );
    }

    #[test]
    fn math_inside_image_alt_stays_text() {
        let segments = segment("![area $r^2$](/img/circle.png)").unwrap();
        assert_eq!(
            segments,
            vec![html(
                "<p><img src=\"/img/circle.png\" alt=\"area $r^2$\" /></p>\n"
            )]
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&Segment::Math {
            expression: "x".into(),
            display: false,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"math","expression":"x","display":false}"#);
    }
}
