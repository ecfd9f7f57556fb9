//! Heading outline extraction and anchor ids.
//!
//! Headings are read straight from the raw document lines, not from the
//! rendered html. The html writer in [`crate::writer`] calls [`parse_heading_line`]
//! and [`heading_id`] on the same source line, so the id on a rendered `<h2>` and
//! the id in the outline always agree.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Deepest heading level that takes part in the outline
pub const MAX_OUTLINE_LEVEL: usize = 3;

/// Used when a heading's text strips down to nothing
pub const FALLBACK_HEADING_ID: &str = "heading";

pub static HEADING_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").unwrap());

// ASCII word characters, whitespace and the Thai block from ko kai to khomut.
static NON_ID_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s\x{0E01}-\x{0E5B}]").unwrap());

static WHITESPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Heading {
    /// 1 to 3, the number of leading `#`
    pub level: usize,
    pub text: String,
    pub id: String,
}

impl Heading {
    pub fn new(level: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let id = heading_id(&text);
        Self { level, text, id }
    }
}

/// Derive the anchor id for a heading's text.
///
/// Lowercases, drops everything that is not an ASCII word character,
/// whitespace or Thai, then turns whitespace runs into single hyphens.
/// Two headings with the same text get the same id.
///
/// ```
/// use khanit_renderer::headings::heading_id;
///
/// assert_eq!(heading_id("Hello World"), "hello-world");
/// assert_eq!(heading_id("บทที่ 1: เซต"), "บทที่-1-เซต");
/// ```
pub fn heading_id(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept = NON_ID_CHARS_RE.replace_all(&lowered, "");
    let id = WHITESPACE_RUN_RE.replace_all(&kept, "-").into_owned();
    if id.is_empty() || id.chars().all(|c| c == '-') {
        FALLBACK_HEADING_ID.to_string()
    } else {
        id
    }
}

/// Match a single raw line against the outline heading pattern.
///
/// Returns the level and the trimmed heading text.
pub fn parse_heading_line(line: &str) -> Option<(usize, &str)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let caps = HEADING_LINE_RE.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2)?.as_str().trim();
    if text.is_empty() {
        return None;
    }
    Some((level, text))
}

/// Scan a raw document for `#`, `##` and `###` headings, in document order.
///
/// Lines inside fenced code blocks are skipped, so a `# comment` in a shell
/// sample does not end up in the outline.
pub fn extract_headings(document: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in document.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            continue;
        }
        if let Some((level, text)) = parse_heading_line(line) {
            headings.push(Heading::new(level, text));
        }
    }

    tracing::trace!(count = headings.len(), "extracted headings");
    headings
}

/// An open fenced code block, as far as line scanning is concerned.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fence {
    marker: char,
    len: usize,
}

/// The line with up to three leading spaces removed, or `None` when it is
/// indented further (an indented code line, not a fence).
fn fence_candidate(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(' ');
    (line.len() - trimmed.len() <= 3).then_some(trimmed)
}

impl Fence {
    pub(crate) fn open(line: &str) -> Option<Self> {
        let trimmed = fence_candidate(line)?;
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        // backtick fences can't carry backticks in the info string
        if marker == '`' && trimmed[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        let Some(trimmed) = fence_candidate(line) else {
            return false;
        };
        let trimmed = trimmed.trim_end();
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && run == trimmed.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_levels_in_order() {
        let headings = extract_headings("# Title\n\nSome text\n## Sub");
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].text, "Title");
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].text, "Sub");
        assert_ne!(headings[0].id, headings[1].id);
        assert_eq!(headings[0].id, "title");
        assert_eq!(headings[1].id, "sub");
    }

    #[test]
    fn keeps_thai_text_in_ids() {
        let headings = extract_headings("## ทฤษฎีความน่าจะเป็น");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].level, 2);
        assert_eq!(headings[0].text, "ทฤษฎีความน่าจะเป็น");
        assert_eq!(headings[0].id, "ทฤษฎีความน่าจะเป็น");
        assert!(!headings[0].id.chars().any(char::is_whitespace));
    }

    #[test]
    fn ignores_deeper_levels_and_missing_space() {
        let headings = extract_headings("#### Deep\n#NoSpace\n### Ok");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Ok");
        assert_eq!(headings[0].level, 3);
    }

    #[test]
    fn skips_lines_inside_code_fences() {
        let doc = "# Real\n\n```bash\n# not a heading\n```\n\n## Also real";
        let headings = extract_headings(doc);
        let texts: Vec<_> = headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, ["Real", "Also real"]);
    }

    #[test]
    fn tilde_fence_needs_matching_close() {
        let doc = "~~~~\n# hidden\n~~~\n# still hidden\n~~~~\n# shown";
        let headings = extract_headings(doc);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "shown");
    }

    #[test]
    fn deeply_indented_fence_does_not_close() {
        // four spaces make the inner line code content, not a closing fence
        let doc = "```\n    ```\n# x\n```\n## after";
        let headings = extract_headings(doc);
        let texts: Vec<_> = headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, ["after"]);
    }

    #[test]
    fn closing_fence_allows_small_indent() {
        let doc = "```\n# hidden\n   ```  \n# shown";
        let headings = extract_headings(doc);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "shown");
    }

    #[test]
    fn duplicate_texts_share_an_id() {
        let headings = extract_headings("## Example\n\n## Example");
        assert_eq!(headings[0].id, headings[1].id);
    }

    #[test]
    fn id_is_stable_and_strips_punctuation() {
        assert_eq!(heading_id("What's new? (2024)"), "whats-new-2024");
        assert_eq!(heading_id("Sub-section"), "subsection");
        assert_eq!(heading_id("  spaced   out  "), "-spaced-out-");
        assert_eq!(heading_id("Title"), heading_id("Title"));
    }

    #[test]
    fn punctuation_only_heading_falls_back() {
        assert_eq!(heading_id("!!!"), FALLBACK_HEADING_ID);
        assert_eq!(heading_id("—"), FALLBACK_HEADING_ID);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let headings = extract_headings("# Title\r\n## Next\r\n");
        assert_eq!(headings[0].text, "Title");
        assert_eq!(headings[1].id, "next");
    }
}
