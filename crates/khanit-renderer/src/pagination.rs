//! Page number strips for article listings.

use std::fmt::Write as _;

use pulldown_cmark_escape::{FmtWriter, escape_html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageItem {
    Page { number: u32 },
    Ellipsis,
}

/// Page 1, a window of one page either side of `current`, and the last
/// page, with ellipses over the gaps.
pub fn page_items(current: u32, total: u32) -> Vec<PageItem> {
    let mut items = vec![PageItem::Page { number: 1 }];
    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total.saturating_sub(1));

    if start > 2 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(|number| PageItem::Page { number }));
    if end < total.saturating_sub(1) {
        items.push(PageItem::Ellipsis);
    }
    if total > 1 {
        items.push(PageItem::Page { number: total });
    }
    items
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub total: u32,
    /// Prefix for page links, e.g. `/blog?` or `/blog?tag=math&`
    pub base_path: String,
}

impl Pagination {
    pub fn new(current: u32, total: u32, base_path: impl Into<String>) -> Self {
        Self {
            current,
            total,
            base_path: base_path.into(),
        }
    }

    pub fn href(&self, page: u32) -> String {
        format!("{}page={page}", self.base_path)
    }

    pub fn previous(&self) -> Option<String> {
        (self.current > 1).then(|| self.href(self.current - 1))
    }

    pub fn next(&self) -> Option<String> {
        (self.current < self.total).then(|| self.href(self.current + 1))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from("<nav class=\"pagination\">\n<ul>\n");
        if let Some(prev) = self.previous() {
            self.push_link(&mut out, &prev, "Previous page", "&lsaquo;");
        }
        for item in page_items(self.current, self.total) {
            match item {
                PageItem::Ellipsis => out.push_str("<li><span>...</span></li>\n"),
                PageItem::Page { number } => {
                    out.push_str("<li><a href=\"");
                    let _ = escape_html(FmtWriter(&mut out), &self.href(number));
                    out.push('"');
                    if number == self.current {
                        out.push_str(" class=\"current\" aria-current=\"page\"");
                    }
                    let _ = writeln!(out, ">{number}</a></li>");
                }
            }
        }
        if let Some(next) = self.next() {
            self.push_link(&mut out, &next, "Next page", "&rsaquo;");
        }
        out.push_str("</ul>\n</nav>\n");
        out
    }

    fn push_link(&self, out: &mut String, href: &str, label: &str, glyph: &str) {
        out.push_str("<li><a href=\"");
        let _ = escape_html(FmtWriter(&mut *out), href);
        let _ = writeln!(out, "\" aria-label=\"{label}\">{glyph}</a></li>");
    }
}
