//! Math delimiters the markdown tokenizer leaves behind.
//!
//! pulldown-cmark only opens inline math when the `$` is directly followed by
//! a non-space character, and a blank line ends a paragraph before a `$$`
//! block can close. Articles use both styles (`$ x + y $`, `aligned` blocks
//! with blank lines between rows), so this module picks them up on either
//! side of the tokenizer:
//!
//! - [`bridge_display_blocks`] runs before tokenizing and keeps a multi-line
//!   `$$` block in one paragraph.
//! - [`find_padded_math`] runs over the text the tokenizer left between its
//!   own math spans.
//!
//! A `$` that only opens (a price such as `$5`) stays literal text.

use std::borrow::Cow;
use std::ops::Range;

use crate::headings::Fence;

/// Written over blank lines inside a `$$` block while the document is
/// tokenized, and removed again before the expression leaves the writer.
pub const BLANK_LINE_BRIDGE: char = '\u{2060}';

const DISPLAY_DELIMITER: &str = "$$";

/// Fill the blank lines of every multi-line `$$` block that has a closing
/// `$$` further down, so the tokenizer sees the whole block as one span.
///
/// The opening `$$` must start its line (at most three spaces of indent) and
/// must not be closed on that same line. Blocks inside code fences are left
/// alone. Returns the input unchanged when there is nothing to bridge.
pub fn bridge_display_blocks(document: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = document.split_inclusive('\n').collect();
    let mut bridged = vec![false; lines.len()];
    let mut fence: Option<Fence> = None;
    let mut ix = 0;

    while ix < lines.len() {
        let line = lines[ix];
        if let Some(open) = fence {
            if open.is_closed_by(line.trim_end_matches(['\n', '\r'])) {
                fence = None;
            }
            ix += 1;
            continue;
        }
        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            ix += 1;
            continue;
        }
        if !opens_display_block(line) {
            ix += 1;
            continue;
        }
        let Some(close) = (ix + 1..lines.len()).find(|&j| lines[j].contains(DISPLAY_DELIMITER))
        else {
            // unterminated, the rest of the document is prose
            break;
        };
        for inner in ix + 1..close {
            if lines[inner].trim().is_empty() {
                bridged[inner] = true;
            }
        }
        ix = close + 1;
    }

    if !bridged.contains(&true) {
        return Cow::Borrowed(document);
    }
    let mut out = String::with_capacity(document.len() + 8);
    for (line, bridge) in lines.iter().zip(bridged) {
        if bridge {
            out.push(BLANK_LINE_BRIDGE);
        }
        out.push_str(line);
    }
    tracing::trace!("bridged blank lines in display math");
    Cow::Owned(out)
}

fn opens_display_block(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    trimmed
        .strip_prefix(DISPLAY_DELIMITER)
        .is_some_and(|rest| !rest.contains(DISPLAY_DELIMITER))
}

/// Remove any [`BLANK_LINE_BRIDGE`] from tokenizer output.
pub fn unbridge(text: &str) -> Cow<'_, str> {
    if text.contains(BLANK_LINE_BRIDGE) {
        Cow::Owned(text.replace(BLANK_LINE_BRIDGE, ""))
    } else {
        Cow::Borrowed(text)
    }
}

/// Find the next `$ ... $` span in `text`, starting at byte `from`, whose
/// opening `$` is followed by whitespace.
///
/// Returns the byte range of the whole span, delimiters included, and the
/// expression with its padding trimmed. `literal` lists byte offsets of `$`
/// signs the author escaped; those never delimit. A closing `$` directly
/// followed by a digit doesn't close (`$ 5 to $10`), and a blank expression
/// isn't math.
pub fn find_padded_math<'t>(
    text: &'t str,
    from: usize,
    literal: &[usize],
) -> Option<(Range<usize>, &'t str)> {
    let delimiters: Vec<usize> = text
        .get(from..)?
        .match_indices('$')
        .map(|(ix, _)| from + ix)
        .filter(|ix| !literal.contains(ix))
        .collect();

    for (nth, &open) in delimiters.iter().enumerate() {
        if !text[open + 1..].starts_with(char::is_whitespace) {
            continue;
        }
        let Some(&close) = delimiters.get(nth + 1) else {
            return None;
        };
        if text[close + 1..].starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let expression = text[open + 1..close].trim();
        if expression.is_empty() {
            continue;
        }
        return Some((open..close + 1, expression));
    }
    None
}
