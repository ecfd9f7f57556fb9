//! Table of contents and scroll tracking.
//!
//! The table itself is plain markup built from [`extract_headings`]. Which
//! entry is "active" is decided by a [`ScrollSpy`], fed by whatever host can
//! report element visibility (a browser's IntersectionObserver, a TUI pager,
//! a test double) through [`ViewportObserver`].

use std::fmt;
use std::sync::{Arc, RwLock};

use pulldown_cmark_escape::{FmtWriter, escape_href, escape_html, escape_html_body_text};

use crate::headings::{Heading, extract_headings};

pub const TOC_TITLE: &str = "สารบัญ";

const CHEVRON_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" class="toc-chevron" fill="none" viewBox="0 0 24 24" stroke="currentColor"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M19 9l-7 7-7-7"/></svg>"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOfContents {
    headings: Vec<Heading>,
}

impl TableOfContents {
    pub fn new(headings: Vec<Heading>) -> Self {
        Self { headings }
    }

    pub fn from_document(document: &str) -> Self {
        Self::new(extract_headings(document))
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
    }

    /// Collapsible nav markup. Empty when there are no headings.
    pub fn to_html(&self, active: Option<&str>) -> String {
        let mut out = String::new();
        if self.headings.is_empty() {
            return out;
        }
        out.push_str("<div class=\"toc\">\n");
        out.push_str("<button type=\"button\" class=\"toc-toggle\" aria-expanded=\"false\"><span>");
        out.push_str(TOC_TITLE);
        out.push_str("</span>");
        out.push_str(CHEVRON_ICON);
        out.push_str("</button>\n<nav class=\"toc-nav\" hidden>\n<ul>\n");
        for heading in &self.headings {
            match indent_class(heading.level) {
                Some(class) => {
                    out.push_str("<li class=\"");
                    out.push_str(class);
                    out.push_str("\">");
                }
                None => out.push_str("<li>"),
            }
            out.push_str("<a href=\"#");
            let _ = escape_href(FmtWriter(&mut out), &heading.id);
            out.push_str("\" data-target=\"");
            let _ = escape_html(FmtWriter(&mut out), &heading.id);
            out.push('"');
            if active == Some(heading.id.as_str()) {
                out.push_str(" class=\"active\"");
            }
            out.push('>');
            let _ = escape_html_body_text(FmtWriter(&mut out), &heading.text);
            out.push_str("</a></li>\n");
        }
        out.push_str("</ul>\n</nav>\n</div>\n");
        out
    }
}

fn indent_class(level: usize) -> Option<&'static str> {
    match level {
        1 => None,
        2 => Some("ml-4"),
        _ => Some("ml-8"),
    }
}

/// One side of a viewport margin, in CSS `rootMargin` terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginLength {
    Px(f64),
    Percent(f64),
}

impl MarginLength {
    fn parse(s: &str) -> Option<Self> {
        if let Some(n) = s.strip_suffix('%') {
            n.parse().ok().map(Self::Percent)
        } else if let Some(n) = s.strip_suffix("px") {
            n.parse().ok().map(Self::Px)
        } else if s == "0" {
            Some(Self::Px(0.0))
        } else {
            None
        }
    }

    fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Grows (positive) or shrinks (negative) the viewport before intersection
/// is tested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl Default for ViewportMargin {
    /// `0px 0px -80% 0px`: only the top fifth of the viewport counts.
    fn default() -> Self {
        Self {
            top: MarginLength::Px(0.0),
            right: MarginLength::Px(0.0),
            bottom: MarginLength::Percent(-80.0),
            left: MarginLength::Px(0.0),
        }
    }
}

impl ViewportMargin {
    /// Parse a CSS margin shorthand of one to four lengths.
    pub fn parse(s: &str) -> Option<Self> {
        let parts = s
            .split_whitespace()
            .map(MarginLength::parse)
            .collect::<Option<Vec<_>>>()?;
        let (top, right, bottom, left) = match parts.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    pub fn root_margin(&self) -> String {
        self.to_string()
    }

    /// Whether an element spanning `top..bottom` (viewport coordinates)
    /// intersects a viewport of `height` after this margin is applied.
    pub fn intersects(&self, bounds: ElementBounds, height: f64) -> bool {
        let root_top = -self.top.resolve(height);
        let root_bottom = height + self.bottom.resolve(height);
        root_top < root_bottom && bounds.top < root_bottom && bounds.bottom > root_top
    }
}

impl fmt::Display for ViewportMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub top: f64,
    pub bottom: f64,
}

/// A visibility change reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn from_bounds(
        id: impl Into<String>,
        bounds: ElementBounds,
        viewport_height: f64,
        margin: &ViewportMargin,
    ) -> Self {
        Self {
            id: id.into(),
            is_intersecting: margin.intersects(bounds, viewport_height),
        }
    }
}

/// Host capability that watches elements by id.
pub trait ViewportObserver {
    fn observe(&mut self, id: &str, margin: &ViewportMargin);
    fn unobserve(&mut self, id: &str);
}

/// Read handle on the id of the heading currently in view.
///
/// Only the [`ScrollSpy`] that handed it out can change it.
#[derive(Debug, Clone, Default)]
pub struct ActiveHeading(Arc<RwLock<Option<String>>>);

impl ActiveHeading {
    pub fn get(&self) -> Option<String> {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, id: &str) {
        let mut guard = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(id.to_string());
    }
}

/// Tracks which heading is in view.
///
/// Every heading id is registered with the observer on [`ScrollSpy::attach`]
/// and unregistered when the spy is dropped.
#[derive(Debug)]
pub struct ScrollSpy<O: ViewportObserver> {
    observer: O,
    ids: Vec<String>,
    active: ActiveHeading,
}

impl<O: ViewportObserver> ScrollSpy<O> {
    pub fn attach(mut observer: O, headings: &[Heading], margin: &ViewportMargin) -> Self {
        let ids: Vec<String> = headings.iter().map(|h| h.id.clone()).collect();
        for id in &ids {
            observer.observe(id, margin);
        }
        tracing::debug!(count = ids.len(), %margin, "scroll spy attached");
        Self {
            observer,
            ids,
            active: ActiveHeading::default(),
        }
    }

    pub fn active(&self) -> ActiveHeading {
        self.active.clone()
    }

    /// Apply a batch of visibility changes. The last intersecting entry
    /// for a tracked heading wins.
    pub fn on_intersection(&self, entries: &[IntersectionEntry]) {
        for entry in entries {
            if entry.is_intersecting && self.ids.iter().any(|id| *id == entry.id) {
                self.active.set(&entry.id);
            }
        }
    }

    /// Marks a heading active directly, as when its ToC link is followed.
    pub fn jump_to(&self, id: &str) {
        if self.ids.iter().any(|tracked| tracked == id) {
            self.active.set(id);
        }
    }
}

impl<O: ViewportObserver> Drop for ScrollSpy<O> {
    fn drop(&mut self) {
        for id in &self.ids {
            self.observer.unobserve(id);
        }
    }
}

/// Browser wiring for the ToC: toggle, smooth scroll and active tracking.
pub fn toc_script(margin: &ViewportMargin) -> String {
    format!(
        r#"<script>
(() => {{
  const toc = document.querySelector('.toc');
  if (!toc) return;
  const nav = toc.querySelector('.toc-nav');
  const toggle = toc.querySelector('.toc-toggle');
  toggle.addEventListener('click', () => {{
    const open = nav.hidden;
    nav.hidden = !open;
    toggle.setAttribute('aria-expanded', String(open));
    toggle.classList.toggle('open', open);
  }});
  const links = new Map();
  toc.querySelectorAll('a[data-target]').forEach((a) => links.set(a.dataset.target, a));
  const activate = (id) => links.forEach((a, key) => a.classList.toggle('active', key === id));
  links.forEach((a, id) => a.addEventListener('click', (e) => {{
    e.preventDefault();
    document.getElementById(id)?.scrollIntoView({{ behavior: 'smooth' }});
    activate(id);
  }}));
  const observer = new IntersectionObserver((entries) => {{
    entries.forEach((entry) => {{ if (entry.isIntersecting) activate(entry.target.id); }});
  }}, {{ rootMargin: '{margin}' }});
  links.forEach((_, id) => {{
    const el = document.getElementById(id);
    if (el) observer.observe(el);
  }});
}})();
</script>
"#
    )
}
