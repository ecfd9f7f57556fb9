//! Share links and the copy-link action for an article.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use pulldown_cmark_escape::{FmtWriter, escape_html};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

use crate::clipboard::Clipboard;
use crate::error::HostError;

/// Characters left alone by javascript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

pub const COPY_LINK_SUCCESS: &str = "คัดลอกลิงก์แล้ว";
pub const COPY_LINK_FAILURE: &str = "ไม่สามารถคัดลอกลิงก์ได้";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareTarget {
    Facebook,
    Twitter,
    LinkedIn,
}

impl ShareTarget {
    pub const ALL: [ShareTarget; 3] = [Self::Facebook, Self::Twitter, Self::LinkedIn];

    pub fn name(self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Twitter => "Twitter",
            Self::LinkedIn => "LinkedIn",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Facebook => {
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="currentColor"><path d="M9.198 21.5h4V13.49h3.604l.396-3.98h-4V7.5a1 1 0 0 1 1-1h3v-4h-3a5 5 0 0 0-5 5v2.01h-2l-.396 3.98h2.396V21.5z"/></svg>"#
            }
            Self::Twitter => {
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="currentColor"><path d="M22.162 5.656a8.384 8.384 0 0 1-2.402.658A4.196 4.196 0 0 0 21.6 4a8.358 8.358 0 0 1-2.656 1.015 4.182 4.182 0 0 0-7.126 3.814 11.874 11.874 0 0 1-8.62-4.37 4.168 4.168 0 0 0-.566 2.103c0 1.45.738 2.731 1.86 3.481a4.168 4.168 0 0 1-1.894-.523v.052a4.185 4.185 0 0 0 3.355 4.101 4.21 4.21 0 0 1-1.89.072A4.185 4.185 0 0 0 7.97 16.65a8.394 8.394 0 0 1-6.191 1.732 11.83 11.83 0 0 0 6.41 1.88c7.693 0 11.9-6.373 11.9-11.9 0-.18-.005-.362-.013-.54a8.496 8.496 0 0 0 2.087-2.165z"/></svg>"#
            }
            Self::LinkedIn => {
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="currentColor"><path d="M6.94 5a2 2 0 1 1-4-.002 2 2 0 0 1 4 .002zM7 8.48H3V21h4V8.48zm6.32 0H9.34V21h3.94v-6.57c0-3.66 4.77-4 4.77 0V21H22v-7.93c0-6.17-7.06-5.94-8.72-2.91l.04-1.68z"/></svg>"#
            }
        }
    }
}

/// Share endpoint templates. `{url}` and `{title}` are replaced with the
/// encoded page url and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTemplates {
    pub facebook: SmolStr,
    pub twitter: SmolStr,
    pub linkedin: SmolStr,
}

impl Default for ShareTemplates {
    fn default() -> Self {
        Self {
            facebook: SmolStr::new_static("https://www.facebook.com/sharer/sharer.php?u={url}"),
            twitter: SmolStr::new_static("https://twitter.com/intent/tweet?text={title}&url={url}"),
            linkedin: SmolStr::new_static("https://www.linkedin.com/sharing/share-offsite/?url={url}"),
        }
    }
}

impl ShareTemplates {
    pub fn template(&self, target: ShareTarget) -> &str {
        match target {
            ShareTarget::Facebook => &self.facebook,
            ShareTarget::Twitter => &self.twitter,
            ShareTarget::LinkedIn => &self.linkedin,
        }
    }
}

/// What gets shared: the canonical url plus title and summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: Url,
}

/// Host share sheet, where one exists
pub trait NativeShare {
    fn share(&self, data: &ShareData) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyLinkOutcome {
    Copied,
    Failed,
}

impl CopyLinkOutcome {
    /// Alert text for the reader
    pub fn message(self) -> &'static str {
        match self {
            Self::Copied => COPY_LINK_SUCCESS,
            Self::Failed => COPY_LINK_FAILURE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShareActions {
    data: ShareData,
    templates: ShareTemplates,
}

impl ShareActions {
    pub fn new(data: ShareData, templates: ShareTemplates) -> Self {
        Self { data, templates }
    }

    pub fn data(&self) -> &ShareData {
        &self.data
    }

    pub fn share_url(&self, target: ShareTarget) -> String {
        self.templates
            .template(target)
            .replace("{url}", &encode_uri_component(self.data.url.as_str()))
            .replace("{title}", &encode_uri_component(&self.data.title))
    }

    pub fn copy_link(&self, clipboard: &mut impl Clipboard) -> CopyLinkOutcome {
        match clipboard.write_text(self.data.url.as_str()) {
            Ok(()) => CopyLinkOutcome::Copied,
            Err(err) => {
                tracing::debug!(error = %err, "copy link failed");
                CopyLinkOutcome::Failed
            }
        }
    }

    /// Hand off to the host share sheet. Returns whether it completed;
    /// cancellation and errors are logged and otherwise ignored.
    pub fn share_native(&self, native: Option<&dyn NativeShare>) -> bool {
        let Some(native) = native else {
            return false;
        };
        match native.share(&self.data) {
            Ok(()) => true,
            Err(HostError::ShareCancelled) => {
                tracing::debug!("native share cancelled");
                false
            }
            Err(err) => {
                tracing::debug!(error = %err, "native share failed");
                false
            }
        }
    }

    /// The share bar. The native-share button stays hidden until the
    /// script finds `navigator.share`.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<div class=\"share-bar\">\n<span class=\"share-label\">แชร์:</span>\n");
        for target in ShareTarget::ALL {
            out.push_str("<a class=\"share-button\" target=\"_blank\" rel=\"noopener noreferrer\" href=\"");
            let _ = escape_html(FmtWriter(&mut out), &self.share_url(target));
            out.push_str("\" aria-label=\"Share on ");
            out.push_str(target.name());
            out.push_str("\">");
            out.push_str(target.icon());
            out.push_str("</a>\n");
        }
        out.push_str("<button type=\"button\" class=\"share-button share-native\" aria-label=\"Share\" hidden");
        push_data_attrs(&mut out, &self.data);
        out.push_str("><svg xmlns=\"http://www.w3.org/2000/svg\" width=\"20\" height=\"20\" viewBox=\"0 0 24 24\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linecap=\"round\" stroke-linejoin=\"round\"><path d=\"M4 12v8a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2v-8\"></path><polyline points=\"16 6 12 2 8 6\"></polyline><line x1=\"12\" y1=\"2\" x2=\"12\" y2=\"15\"></line></svg></button>\n");
        out.push_str("<button type=\"button\" class=\"share-button share-copy\" aria-label=\"Copy link\" data-url=\"");
        let _ = escape_html(FmtWriter(&mut out), self.data.url.as_str());
        out.push_str("\"><svg xmlns=\"http://www.w3.org/2000/svg\" width=\"20\" height=\"20\" viewBox=\"0 0 24 24\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linecap=\"round\" stroke-linejoin=\"round\"><path d=\"M10 13a5 5 0 0 0 7.54.54l3-3a5 5 0 0 0-7.07-7.07l-1.72 1.71\"></path><path d=\"M14 11a5 5 0 0 0-7.54-.54l-3 3a5 5 0 0 0 7.07 7.07l1.71-1.71\"></path></svg></button>\n");
        out.push_str("</div>\n");
        out
    }
}

fn push_data_attrs(out: &mut String, data: &ShareData) {
    for (name, value) in [
        ("title", data.title.as_str()),
        ("text", data.text.as_str()),
        ("url", data.url.as_str()),
    ] {
        out.push_str(" data-");
        out.push_str(name);
        out.push_str("=\"");
        let _ = escape_html(FmtWriter(&mut *out), value);
        out.push('"');
    }
}

/// Browser side of the share bar and the code copy buttons.
pub fn share_script(copy_feedback_ms: u64) -> String {
    format!(
        r#"<script>
(() => {{
  document.querySelectorAll('.share-native').forEach((btn) => {{
    if (!('share' in navigator)) return;
    btn.hidden = false;
    btn.addEventListener('click', async () => {{
      try {{
        await navigator.share({{ title: btn.dataset.title, text: btn.dataset.text, url: btn.dataset.url }});
      }} catch (err) {{
        console.debug('share cancelled', err);
      }}
    }});
  }});
  document.querySelectorAll('.share-copy').forEach((btn) => btn.addEventListener('click', async () => {{
    try {{
      await navigator.clipboard.writeText(btn.dataset.url);
      alert('{COPY_LINK_SUCCESS}');
    }} catch (err) {{
      alert('{COPY_LINK_FAILURE}');
    }}
  }}));
  document.querySelectorAll('.copy-code').forEach((btn) => btn.addEventListener('click', async () => {{
    try {{
      await navigator.clipboard.writeText(btn.dataset.code);
    }} catch (err) {{
      return;
    }}
    btn.classList.add('copied');
    btn.querySelector('.icon-copy').hidden = true;
    btn.querySelector('.icon-check').hidden = false;
    setTimeout(() => {{
      btn.classList.remove('copied');
      btn.querySelector('.icon-copy').hidden = false;
      btn.querySelector('.icon-check').hidden = true;
    }}, {copy_feedback_ms});
  }}));
}})();
</script>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;
    use std::cell::RefCell;

    fn actions() -> ShareActions {
        ShareActions::new(
            ShareData {
                title: "ความน่าจะเป็น & สถิติ".into(),
                text: "บทนำ".into(),
                url: Url::parse("https://khanit.example/blog/probability").unwrap(),
            },
            ShareTemplates::default(),
        )
    }

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(
            encode_uri_component("a b&c=d/e?f#g"),
            "a%20b%26c%3Dd%2Fe%3Ff%23g"
        );
        assert_eq!(encode_uri_component("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_uri_component("ก"), "%E0%B8%81");
    }

    #[test]
    fn builds_platform_urls() {
        let actions = actions();
        assert_eq!(
            actions.share_url(ShareTarget::Facebook),
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fkhanit.example%2Fblog%2Fprobability"
        );
        let twitter = actions.share_url(ShareTarget::Twitter);
        assert!(twitter.starts_with("https://twitter.com/intent/tweet?text=%E0%B8%84"));
        assert!(twitter.contains("%20%26%20"));
        assert!(twitter.ends_with("&url=https%3A%2F%2Fkhanit.example%2Fblog%2Fprobability"));
        assert_eq!(
            actions.share_url(ShareTarget::LinkedIn),
            "https://www.linkedin.com/sharing/share-offsite/?url=https%3A%2F%2Fkhanit.example%2Fblog%2Fprobability"
        );
    }

    #[test]
    fn custom_templates_are_used() {
        let templates = ShareTemplates {
            facebook: "https://fb.example/?link={url}&t={title}".into(),
            ..Default::default()
        };
        let actions = ShareActions::new(actions().data().clone(), templates);
        assert!(
            actions
                .share_url(ShareTarget::Facebook)
                .starts_with("https://fb.example/?link=https%3A")
        );
    }

    #[test]
    fn copy_link_reports_outcome() {
        let actions = actions();
        let mut clipboard = MemoryClipboard::default();
        let outcome = actions.copy_link(&mut clipboard);
        assert_eq!(outcome, CopyLinkOutcome::Copied);
        assert_eq!(outcome.message(), "คัดลอกลิงก์แล้ว");
        assert_eq!(
            clipboard.contents.as_deref(),
            Some("https://khanit.example/blog/probability")
        );

        let mut denied = MemoryClipboard {
            deny: true,
            ..Default::default()
        };
        assert_eq!(actions.copy_link(&mut denied), CopyLinkOutcome::Failed);
    }

    struct FakeShare {
        result: fn() -> Result<(), HostError>,
        seen: RefCell<Option<ShareData>>,
    }

    impl NativeShare for FakeShare {
        fn share(&self, data: &ShareData) -> Result<(), HostError> {
            *self.seen.borrow_mut() = Some(data.clone());
            (self.result)()
        }
    }

    #[test]
    fn native_share_delegates_and_swallows_failures() {
        let actions = actions();
        assert!(!actions.share_native(None));

        let ok = FakeShare {
            result: || Ok(()),
            seen: RefCell::new(None),
        };
        assert!(actions.share_native(Some(&ok)));
        assert_eq!(ok.seen.borrow().as_ref().map(|d| d.text.as_str()), Some("บทนำ"));

        let cancelled = FakeShare {
            result: || Err(HostError::ShareCancelled),
            seen: RefCell::new(None),
        };
        assert!(!actions.share_native(Some(&cancelled)));

        let broken = FakeShare {
            result: || Err(HostError::Share("no target".into())),
            seen: RefCell::new(None),
        };
        assert!(!actions.share_native(Some(&broken)));
    }

    #[test]
    fn share_bar_escapes_urls() {
        let html = actions().to_html();
        assert!(html.contains("href=\"https://twitter.com/intent/tweet?text="));
        assert!(html.contains("&amp;url=https%3A%2F%2Fkhanit.example"));
        assert!(html.contains("aria-label=\"Share on LinkedIn\""));
        assert!(html.contains("data-title=\"ความน่าจะเป็น &amp; สถิติ\""));
    }
}
