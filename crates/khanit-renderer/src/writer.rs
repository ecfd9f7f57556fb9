//! Event-stream html writer that splits an article into [`Segment`]s.
//!
//! Built on the shape of pulldown-cmark's own html writer, with these changes:
//! math and code blocks become their own segments instead of markup, h1-h3
//! get anchor ids when they are written, and soft breaks can be forced to
//! `<br />`. Adjacent text events are gathered first so padded `$ x $` spans
//! the tokenizer passed over still come out as math (see [`crate::lexer`]).

use std::collections::HashMap;
use std::fmt::Write as _;
use std::ops::Range;

use pulldown_cmark::{
    Alignment, BlockQuoteKind, CodeBlockKind, CowStr, Event, Event::*, HeadingLevel, LinkType, Tag,
    TagEnd,
};
use pulldown_cmark_escape::{FmtWriter, escape_href, escape_html, escape_html_body_text};

use crate::headings::{MAX_OUTLINE_LEVEL, heading_id, parse_heading_line};
use crate::lexer::{find_padded_math, unbridge};
use crate::segment::{DEFAULT_CODE_LANGUAGE, Segment};

pub enum TableState {
    Head,
    Body,
}

/// What the writer does with math and code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Cut math and code out into their own segments
    Segmented,
    /// Write everything as html: math as escaped source in a span, code as
    /// `<pre><code>`
    Inline,
}

pub struct SegmentWriter<'a> {
    /// Events with their source ranges; `as_slice` gives lookahead.
    iter: std::vec::IntoIter<(Event<'a>, Range<usize>)>,
    source: &'a str,
    mode: WriteMode,
    hard_breaks: bool,

    /// Html written since the last segment boundary.
    buffer: String,
    /// Text events not yet written, and the offsets of escaped `$` in it.
    pending_text: String,
    escaped_dollars: Vec<usize>,
    segments: Vec<Segment>,

    /// Whether or not the last write wrote a newline.
    end_newline: bool,

    /// Whether if inside a metadata block (text should not be written)
    in_non_writing_block: bool,

    table_state: TableState,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
    numbers: HashMap<CowStr<'a>, usize>,

    code_buffer: Option<(String, String)>, // (lang, content)
}

impl<'a> SegmentWriter<'a> {
    pub fn new(source: &'a str, events: Vec<(Event<'a>, Range<usize>)>, mode: WriteMode) -> Self {
        Self {
            iter: events.into_iter(),
            source,
            mode,
            hard_breaks: false,
            buffer: String::new(),
            pending_text: String::new(),
            escaped_dollars: Vec::new(),
            segments: Vec::new(),
            end_newline: true,
            in_non_writing_block: false,
            table_state: TableState::Head,
            table_alignments: vec![],
            table_cell_index: 0,
            numbers: HashMap::new(),
            code_buffer: None,
        }
    }

    pub fn hard_breaks(mut self, hard_breaks: bool) -> Self {
        self.hard_breaks = hard_breaks;
        self
    }

    /// Writes a new line.
    #[inline]
    fn write_newline(&mut self) -> std::fmt::Result {
        self.end_newline = true;
        self.buffer.write_str("\n")
    }

    /// Writes a buffer, and tracks whether or not a newline was written.
    #[inline]
    fn write(&mut self, s: &str) -> std::fmt::Result {
        self.buffer.write_str(s)?;

        if !s.is_empty() {
            self.end_newline = s.ends_with('\n');
        }
        Ok(())
    }

    #[inline]
    fn escaped(&mut self, s: &str) -> std::fmt::Result {
        escape_html(FmtWriter(&mut self.buffer), s)
    }

    /// Close off the html written so far as its own segment.
    fn flush_html(&mut self) {
        if !self.buffer.is_empty() {
            let markup = std::mem::take(&mut self.buffer);
            self.segments.push(Segment::Html { markup });
        }
    }

    /// Whether the `$` starting at `offset` in the source is backslash-escaped.
    fn is_escaped_dollar(&self, offset: usize) -> bool {
        let backslashes = self
            .source
            .get(..offset)
            .map_or(0, |before| before.chars().rev().take_while(|c| *c == '\\').count());
        backslashes % 2 == 1
    }

    /// Write the gathered text, cutting out any padded math spans.
    fn flush_text(&mut self) -> std::fmt::Result {
        if self.pending_text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_text);
        let literal = std::mem::take(&mut self.escaped_dollars);
        let mut written = 0;
        while let Some((span, expression)) = find_padded_math(&text, written, &literal) {
            escape_html_body_text(FmtWriter(&mut self.buffer), &text[written..span.start])?;
            self.math(expression, false)?;
            written = span.end;
        }
        escape_html_body_text(FmtWriter(&mut self.buffer), &text[written..])?;
        self.end_newline = text.ends_with('\n');
        Ok(())
    }

    /// Drive the writer to the end of the event stream.
    pub fn run(mut self) -> Result<Vec<Segment>, std::fmt::Error> {
        while let Some((event, range)) = self.iter.next() {
            if !matches!(event, Text(_)) {
                self.flush_text()?;
            }
            match event {
                Start(tag) => {
                    self.start_tag(tag, range)?;
                }
                End(tag) => {
                    self.end_tag(tag)?;
                }
                Text(text) => {
                    if let Some((_, ref mut buffer)) = self.code_buffer {
                        buffer.push_str(&text);
                    } else if !self.in_non_writing_block {
                        if text.starts_with('$') && self.is_escaped_dollar(range.start) {
                            self.escaped_dollars.push(self.pending_text.len());
                        }
                        self.pending_text.push_str(&unbridge(&text));
                    }
                }
                Code(text) => {
                    self.write("<code>")?;
                    escape_html_body_text(FmtWriter(&mut self.buffer), &text)?;
                    self.write("</code>")?;
                }
                InlineMath(text) => self.math(&text, false)?,
                DisplayMath(text) => self.math(&text, true)?,
                Html(html) | InlineHtml(html) => {
                    self.write(&html)?;
                }
                SoftBreak => {
                    if self.hard_breaks {
                        self.write("<br />\n")?;
                    } else {
                        self.write_newline()?;
                    }
                }
                HardBreak => {
                    self.write("<br />\n")?;
                }
                Rule => {
                    if self.end_newline {
                        self.write("<hr />\n")?;
                    } else {
                        self.write("\n<hr />\n")?;
                    }
                }
                FootnoteReference(name) => {
                    let len = self.numbers.len() + 1;
                    self.write("<sup class=\"footnote-reference\"><a href=\"#")?;
                    self.escaped(&name)?;
                    self.write("\">")?;
                    let number = *self.numbers.entry(name).or_insert(len);
                    write!(&mut self.buffer, "{}", number)?;
                    self.write("</a></sup>")?;
                }
                TaskListMarker(true) => {
                    self.write("<input disabled=\"\" type=\"checkbox\" checked=\"\"/>\n")?;
                }
                TaskListMarker(false) => {
                    self.write("<input disabled=\"\" type=\"checkbox\"/>\n")?;
                }
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }
        self.flush_text()?;
        self.flush_html();
        Ok(self.segments)
    }

    fn math(&mut self, text: &str, display: bool) -> std::fmt::Result {
        let text = unbridge(text);
        let text = text.trim();
        match self.mode {
            WriteMode::Segmented => {
                self.flush_html();
                self.segments.push(Segment::Math {
                    expression: text.to_string(),
                    display,
                });
                if display {
                    self.end_newline = true;
                }
                Ok(())
            }
            WriteMode::Inline => {
                if display {
                    self.write(r#"<span class="math math-display">"#)?;
                } else {
                    self.write(r#"<span class="math math-inline">"#)?;
                }
                self.escaped(text)?;
                self.write("</span>")
            }
        }
    }

    /// A paragraph holding nothing but one `$$...$$` span.
    fn is_display_math_paragraph(&self) -> bool {
        matches!(
            self.iter.as_slice(),
            [(DisplayMath(_), _), (End(TagEnd::Paragraph), _), ..]
        )
    }

    /// Anchor id for an h1-h3, computed from the raw source line so it matches
    /// [`crate::headings::extract_headings`].
    fn anchor_for(&self, level: HeadingLevel, range: &Range<usize>) -> Option<String> {
        let level = level as usize;
        if level > MAX_OUTLINE_LEVEL {
            return None;
        }
        let line = self.source.get(range.clone())?.lines().next()?;
        match parse_heading_line(line) {
            Some((line_level, text)) if line_level == level => Some(heading_id(text)),
            // setext or indented headings: use the rendered text
            _ => Some(heading_id(&self.heading_plain_text())),
        }
    }

    fn heading_plain_text(&self) -> String {
        let mut text = String::new();
        for (event, _) in self.iter.as_slice() {
            match event {
                End(TagEnd::Heading(_)) => break,
                Text(t) | Code(t) | InlineMath(t) | DisplayMath(t) => text.push_str(t),
                SoftBreak | HardBreak => text.push(' '),
                _ => {}
            }
        }
        text.trim().to_string()
    }

    /// Writes the start of an HTML tag.
    fn start_tag(&mut self, tag: Tag<'a>, range: Range<usize>) -> std::fmt::Result {
        match tag {
            Tag::HtmlBlock => Ok(()),
            Tag::Paragraph => {
                if self.is_display_math_paragraph() {
                    if let Some((DisplayMath(text), _)) = self.iter.next() {
                        self.math(&text, true)?;
                    }
                    // the paragraph's end tag
                    self.iter.next();
                    return Ok(());
                }
                if self.end_newline {
                    self.write("<p>")
                } else {
                    self.write("\n<p>")
                }
            }
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let id = id
                    .map(|id| id.into_string())
                    .or_else(|| self.anchor_for(level, &range));
                if self.end_newline {
                    self.write("<")?;
                } else {
                    self.write("\n<")?;
                }
                write!(&mut self.buffer, "{}", level)?;
                if let Some(id) = id {
                    self.write(" id=\"")?;
                    self.escaped(&id)?;
                    self.write("\"")?;
                }
                let mut classes = classes.iter();
                if let Some(class) = classes.next() {
                    self.write(" class=\"")?;
                    self.escaped(class)?;
                    for class in classes {
                        self.write(" ")?;
                        self.escaped(class)?;
                    }
                    self.write("\"")?;
                }
                for (attr, value) in attrs {
                    self.write(" ")?;
                    self.escaped(&attr)?;
                    if let Some(val) = value {
                        self.write("=\"")?;
                        self.escaped(&val)?;
                        self.write("\"")?;
                    } else {
                        self.write("=\"\"")?;
                    }
                }
                self.write(">")
            }
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.write("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                self.write("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                self.write("<tr>")
            }
            Tag::TableCell => {
                match self.table_state {
                    TableState::Head => {
                        self.write("<th")?;
                    }
                    TableState::Body => {
                        self.write("<td")?;
                    }
                }
                match self.table_alignments.get(self.table_cell_index) {
                    Some(&Alignment::Left) => self.write(" style=\"text-align: left\">"),
                    Some(&Alignment::Center) => self.write(" style=\"text-align: center\">"),
                    Some(&Alignment::Right) => self.write(" style=\"text-align: right\">"),
                    _ => self.write(">"),
                }
            }
            Tag::BlockQuote(kind) => {
                let class_str = match kind {
                    None => "",
                    Some(kind) => match kind {
                        BlockQuoteKind::Note => " class=\"markdown-alert-note\"",
                        BlockQuoteKind::Tip => " class=\"markdown-alert-tip\"",
                        BlockQuoteKind::Important => " class=\"markdown-alert-important\"",
                        BlockQuoteKind::Warning => " class=\"markdown-alert-warning\"",
                        BlockQuoteKind::Caution => " class=\"markdown-alert-caution\"",
                    },
                };
                if self.end_newline {
                    self.write(&format!("<blockquote{}>\n", class_str))
                } else {
                    self.write(&format!("\n<blockquote{}>\n", class_str))
                }
            }
            Tag::CodeBlock(info) => {
                let lang = match info {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                match self.mode {
                    WriteMode::Segmented => {
                        self.flush_html();
                        let lang = lang.unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string());
                        self.code_buffer = Some((lang, String::new()));
                        Ok(())
                    }
                    WriteMode::Inline => {
                        if !self.end_newline {
                            self.write_newline()?;
                        }
                        match lang {
                            Some(lang) => {
                                self.write("<pre><code class=\"language-")?;
                                self.escaped(&lang)?;
                                self.write("\">")
                            }
                            None => self.write("<pre><code>"),
                        }
                    }
                }
            }
            Tag::List(Some(1)) => {
                if self.end_newline {
                    self.write("<ol>\n")
                } else {
                    self.write("\n<ol>\n")
                }
            }
            Tag::List(Some(start)) => {
                if self.end_newline {
                    self.write("<ol start=\"")?;
                } else {
                    self.write("\n<ol start=\"")?;
                }
                write!(&mut self.buffer, "{}", start)?;
                self.write("\">\n")
            }
            Tag::List(None) => {
                if self.end_newline {
                    self.write("<ul>\n")
                } else {
                    self.write("\n<ul>\n")
                }
            }
            Tag::Item => {
                if self.end_newline {
                    self.write("<li>")
                } else {
                    self.write("\n<li>")
                }
            }
            Tag::Emphasis => self.write("<em>"),
            Tag::Strong => self.write("<strong>"),
            Tag::Strikethrough => self.write("<del>"),
            Tag::Link {
                link_type: LinkType::Email,
                dest_url,
                title,
                id: _,
            } => {
                self.write("<a href=\"mailto:")?;
                escape_href(FmtWriter(&mut self.buffer), &dest_url)?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    self.escaped(&title)?;
                }
                self.write("\">")
            }
            Tag::Link {
                link_type: _,
                dest_url,
                title,
                id: _,
            } => {
                self.write("<a href=\"")?;
                escape_href(FmtWriter(&mut self.buffer), &dest_url)?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    self.escaped(&title)?;
                }
                self.write("\">")
            }
            Tag::Image {
                link_type: _,
                dest_url,
                title,
                id: _,
            } => {
                self.write("<img src=\"")?;
                escape_href(FmtWriter(&mut self.buffer), &dest_url)?;
                self.write("\" alt=\"")?;
                self.raw_text()?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    self.escaped(&title)?;
                }
                self.write("\" />")
            }
            Tag::FootnoteDefinition(name) => {
                if self.end_newline {
                    self.write("<div class=\"footnote-definition\" id=\"")?;
                } else {
                    self.write("\n<div class=\"footnote-definition\" id=\"")?;
                }
                self.escaped(&name)?;
                self.write("\"><sup class=\"footnote-definition-label\">")?;
                let len = self.numbers.len() + 1;
                let number = *self.numbers.entry(name).or_insert(len);
                write!(&mut self.buffer, "{}", number)?;
                self.write("</sup>")
            }
            Tag::MetadataBlock(_) => {
                self.in_non_writing_block = true;
                Ok(())
            }
            // definition lists, sub/superscript: not enabled in our options
            _ => Ok(()),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> std::fmt::Result {
        match tag {
            TagEnd::HtmlBlock => {}
            TagEnd::Paragraph => {
                self.write("</p>\n")?;
            }
            TagEnd::Heading(level) => {
                self.write("</")?;
                write!(&mut self.buffer, "{}", level)?;
                self.write(">\n")?;
            }
            TagEnd::Table => {
                self.write("</tbody></table>\n")?;
            }
            TagEnd::TableHead => {
                self.write("</tr></thead><tbody>\n")?;
                self.table_state = TableState::Body;
            }
            TagEnd::TableRow => {
                self.write("</tr>\n")?;
            }
            TagEnd::TableCell => {
                match self.table_state {
                    TableState::Head => {
                        self.write("</th>")?;
                    }
                    TableState::Body => {
                        self.write("</td>")?;
                    }
                }
                self.table_cell_index += 1;
            }
            TagEnd::BlockQuote(_) => {
                self.write("</blockquote>\n")?;
            }
            TagEnd::CodeBlock => match self.code_buffer.take() {
                Some((language, mut source)) => {
                    if source.ends_with('\n') {
                        source.pop();
                    }
                    self.segments.push(Segment::Code { source, language });
                    self.end_newline = true;
                }
                None => {
                    self.write("</code></pre>\n")?;
                }
            },
            TagEnd::List(true) => {
                self.write("</ol>\n")?;
            }
            TagEnd::List(false) => {
                self.write("</ul>\n")?;
            }
            TagEnd::Item => {
                self.write("</li>\n")?;
            }
            TagEnd::Emphasis => {
                self.write("</em>")?;
            }
            TagEnd::Strong => {
                self.write("</strong>")?;
            }
            TagEnd::Strikethrough => {
                self.write("</del>")?;
            }
            TagEnd::Link => {
                self.write("</a>")?;
            }
            TagEnd::Image => (), // shouldn't happen, handled in start
            TagEnd::FootnoteDefinition => {
                self.write("</div>\n")?;
            }
            TagEnd::MetadataBlock(_) => {
                self.in_non_writing_block = false;
            }
            _ => {}
        }
        Ok(())
    }

    // run raw text, consuming end tag
    fn raw_text(&mut self) -> std::fmt::Result {
        let mut nest = 0;
        while let Some((event, _)) = self.iter.next() {
            match event {
                Start(_) => nest += 1,
                End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                Html(_) => {}
                InlineHtml(text) | Code(text) | Text(text) => {
                    // Don't use escape_html_body_text here.
                    // The output of this function is used in the `alt` attribute.
                    self.escaped(&text)?;
                    self.end_newline = text.ends_with('\n');
                }
                InlineMath(text) => {
                    self.write("$")?;
                    self.escaped(&text)?;
                    self.write("$")?;
                }
                DisplayMath(text) => {
                    self.write("$$")?;
                    self.escaped(&text)?;
                    self.write("$$")?;
                }
                SoftBreak | HardBreak | Rule => {
                    self.write(" ")?;
                }
                FootnoteReference(name) => {
                    let len = self.numbers.len() + 1;
                    let number = *self.numbers.entry(name).or_insert(len);
                    write!(&mut self.buffer, "[{}]", number)?;
                }
                TaskListMarker(true) => self.write("[x]")?,
                TaskListMarker(false) => self.write("[ ]")?,
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }
        Ok(())
    }
}
