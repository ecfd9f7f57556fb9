//! Renderer configuration, loadable from a KDL document.
//!
//! ```kdl
//! site-url "https://khanit.example"
//! hard-breaks true
//! light-code-theme "InspiredGitHub"
//! dark-code-theme "base16-ocean.dark"
//! toc-root-margin "0px 0px -80% 0px"
//! copy-feedback-ms 2000
//! utc-offset "+07:00"
//! share-twitter "https://x.com/intent/post?text={title}&url={url}"
//! ```
//!
//! Every node is optional; missing ones keep their defaults.

use std::time::Duration;

use chrono::FixedOffset;
use kdl::{KdlDocument, KdlValue};
use smol_str::SmolStr;
use url::Url;

use crate::ConfigError;
use crate::clipboard::DEFAULT_COPY_FEEDBACK;
use crate::share::ShareTemplates;
use crate::toc::ViewportMargin;

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_LIGHT_CODE_THEME: &str = "InspiredGitHub";
pub const DEFAULT_DARK_CODE_THEME: &str = "base16-ocean.dark";
/// Indochina Time, where the readers are
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Base for canonical article urls
    pub site_url: Url,
    pub hard_breaks: bool,
    pub light_code_theme: SmolStr,
    pub dark_code_theme: SmolStr,
    pub toc_margin: ViewportMargin,
    pub copy_feedback: Duration,
    pub share: ShareTemplates,
    /// Publication dates are shown in this offset
    pub utc_offset: FixedOffset,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            site_url: Url::parse(DEFAULT_SITE_URL).expect("default site url is valid"),
            hard_breaks: true,
            light_code_theme: SmolStr::new_static(DEFAULT_LIGHT_CODE_THEME),
            dark_code_theme: SmolStr::new_static(DEFAULT_DARK_CODE_THEME),
            toc_margin: ViewportMargin::default(),
            copy_feedback: DEFAULT_COPY_FEEDBACK,
            share: ShareTemplates::default(),
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS)
                .expect("default utc offset is in range"),
        }
    }
}

impl RenderConfig {
    /// Parse a KDL config document on top of the defaults.
    pub fn from_kdl(source: &str) -> Result<Self, ConfigError> {
        let doc: KdlDocument = source.parse()?;
        let mut config = Self::default();

        for node in doc.nodes() {
            let value = node.entries().first().map(|entry| entry.value());
            match node.name().value() {
                "site-url" => {
                    let raw = string_arg("site-url", value)?;
                    config.site_url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
                        node: "site-url",
                        source,
                    })?;
                }
                "hard-breaks" => {
                    config.hard_breaks = value
                        .and_then(KdlValue::as_bool)
                        .ok_or(ConfigError::InvalidValue {
                            node: "hard-breaks",
                            expected: "a boolean",
                        })?;
                }
                "light-code-theme" => {
                    config.light_code_theme = string_arg("light-code-theme", value)?.into();
                }
                "dark-code-theme" => {
                    config.dark_code_theme = string_arg("dark-code-theme", value)?.into();
                }
                "toc-root-margin" => {
                    let raw = string_arg("toc-root-margin", value)?;
                    config.toc_margin =
                        ViewportMargin::parse(raw).ok_or(ConfigError::InvalidValue {
                            node: "toc-root-margin",
                            expected: "a css margin such as \"0px 0px -80% 0px\"",
                        })?;
                }
                "copy-feedback-ms" => {
                    let ms = value
                        .and_then(KdlValue::as_i64)
                        .and_then(|ms| u64::try_from(ms).ok())
                        .ok_or(ConfigError::InvalidValue {
                            node: "copy-feedback-ms",
                            expected: "a non-negative integer",
                        })?;
                    config.copy_feedback = Duration::from_millis(ms);
                }
                "share-facebook" => {
                    config.share.facebook = share_template("share-facebook", value)?;
                }
                "share-twitter" => {
                    config.share.twitter = share_template("share-twitter", value)?;
                }
                "share-linkedin" => {
                    config.share.linkedin = share_template("share-linkedin", value)?;
                }
                "utc-offset" => {
                    config.utc_offset = string_arg("utc-offset", value)?
                        .parse::<FixedOffset>()
                        .map_err(|_| ConfigError::InvalidValue {
                            node: "utc-offset",
                            expected: "an offset such as \"+07:00\"",
                        })?;
                }
                other => tracing::warn!(node = other, "ignoring unknown config node"),
            }
        }

        Ok(config)
    }

    pub fn copy_feedback_ms(&self) -> u64 {
        u64::try_from(self.copy_feedback.as_millis()).unwrap_or(u64::MAX)
    }
}

fn string_arg<'a>(node: &'static str, value: Option<&'a KdlValue>) -> Result<&'a str, ConfigError> {
    value
        .and_then(KdlValue::as_string)
        .ok_or(ConfigError::InvalidValue {
            node,
            expected: "a string",
        })
}

fn share_template(node: &'static str, value: Option<&KdlValue>) -> Result<SmolStr, ConfigError> {
    let template = string_arg(node, value)?;
    if !template.contains("{url}") {
        return Err(ConfigError::InvalidValue {
            node,
            expected: "a url template containing {url}",
        });
    }
    Ok(template.into())
}
