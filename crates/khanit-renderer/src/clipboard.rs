//! Copy-to-clipboard controls.
//!
//! The clipboard itself belongs to the host (browser, terminal, test double),
//! reached through [`Clipboard`]. [`CopyButton`] holds the short-lived
//! "copied" confirmation state for a code block's copy control.

use std::time::{Duration, Instant};

use crate::error::HostError;

/// How long the "copied" confirmation stays up
pub const DEFAULT_COPY_FEEDBACK: Duration = Duration::from_millis(2000);

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), HostError>;
}

/// Copy control for one code block.
#[derive(Debug, Clone)]
pub struct CopyButton {
    source: String,
    feedback: Duration,
    copied_until: Option<Instant>,
}

impl CopyButton {
    /// `source` is the literal code, not the highlighted markup.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            feedback: DEFAULT_COPY_FEEDBACK,
            copied_until: None,
        }
    }

    pub fn with_feedback(mut self, feedback: Duration) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Copy the source. On success the confirmation shows until
    /// `now + feedback`; on failure nothing is shown and the error is dropped.
    pub fn activate(&mut self, clipboard: &mut impl Clipboard, now: Instant) -> bool {
        match clipboard.write_text(&self.source) {
            Ok(()) => {
                self.copied_until = Some(now + self.feedback);
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "copy failed, not showing confirmation");
                false
            }
        }
    }

    /// Whether the confirmation is showing at `now`
    pub fn is_confirming(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    /// Label for the control at `now`
    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_confirming(now) {
            "Copied"
        } else {
            "Copy code"
        }
    }
}
