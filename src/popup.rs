//! One-shot "analyze the current tab's email" run.
//!
//! The controller resolves the active tab, injects the body extractor,
//! checks what came back, asks the classifier for a verdict and reports every
//! step through a [`StatusSink`]. It never retries: each run ends in exactly
//! one [`RunOutcome`].

use crate::analysis::{AnalysisError, AnalysisResult, Classifier};
use crate::host::{Browser, HostError};

pub const NO_ACTIVE_TAB: &str = "Error: No active tab found.";
pub const NO_EMAIL_TEXT: &str = "⚠️ No email text found.";
pub const NO_EMAIL_TEXT_HINT: &str =
    "Could not detect email body. Try highlighting the text manually and reopening this popup.";
pub const ANALYZING: &str = "Analyzed by AI...";
pub const EXTRACTION_ERROR: &str = "Extraction Error.";
pub const CONNECTION_ERROR: &str = "Connection Error.";
pub const INVALID_RESPONSE: &str = "Invalid Response.";
pub const PHISHING_DETECTED: &str = "⚠️ PHISHING DETECTED";
pub const LOOKS_SAFE: &str = "✅ LOOKS SAFE";

/// Visual state of the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusClass {
    Loading,
    Danger,
    Safe,
    #[default]
    Neutral,
}

impl StatusClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Loading => "loading",
            StatusClass::Danger => "danger",
            StatusClass::Safe => "safe",
            StatusClass::Neutral => "neutral",
        }
    }
}

/// Where the popup writes its two display regions.
pub trait StatusSink {
    fn set_status(&mut self, text: &str, class: StatusClass);
    fn set_preview(&mut self, text: &str);
}

/// The terminal state a run ended in.
#[derive(Debug)]
pub enum RunOutcome {
    NoActiveTab,
    ExtractionFailed(HostError),
    TextTooShort,
    NetworkFailed(AnalysisError),
    InvalidResponse(AnalysisError),
    ResultRendered(AnalysisResult),
}

impl RunOutcome {
    /// Process exit code for scripted use: 0 safe, 2 phishing, 1 anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::ResultRendered(result) if result.is_phishing => 2,
            RunOutcome::ResultRendered(_) => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupSettings {
    /// Extracted text shorter than this (in chars) is treated as "no email".
    pub min_text_len: usize,
    /// How many chars of the extracted text to show in the preview.
    pub preview_chars: usize,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            min_text_len: 5,
            preview_chars: 200,
        }
    }
}

pub struct PopupController {
    browser: Box<dyn Browser>,
    classifier: Box<dyn Classifier>,
    settings: PopupSettings,
}

impl PopupController {
    pub fn new(
        browser: Box<dyn Browser>,
        classifier: Box<dyn Classifier>,
        settings: PopupSettings,
    ) -> Self {
        Self {
            browser,
            classifier,
            settings,
        }
    }

    pub async fn run(&self, sink: &mut dyn StatusSink) -> RunOutcome {
        let Some(tab) = self.browser.active_tab().await else {
            tracing::warn!("no active tab");
            sink.set_status(NO_ACTIVE_TAB, StatusClass::Neutral);
            return RunOutcome::NoActiveTab;
        };
        tracing::info!(tab = tab.id, location = %tab.location, "inspecting tab");

        let frames = match self.browser.execute_extractor(&tab).await {
            Ok(frames) => frames,
            Err(e) => {
                tracing::error!(error = %e, "extractor injection failed");
                sink.set_status(EXTRACTION_ERROR, StatusClass::Neutral);
                sink.set_preview(&format!("Could not read the page.\nError: {}", e));
                return RunOutcome::ExtractionFailed(e);
            }
        };

        let text = frames.into_iter().next().and_then(|frame| frame.result);
        let text = match text {
            Some(text) if text.chars().count() >= self.settings.min_text_len => text,
            _ => {
                tracing::info!("extracted text too short to analyze");
                sink.set_status(NO_EMAIL_TEXT, StatusClass::Neutral);
                sink.set_preview(NO_EMAIL_TEXT_HINT);
                return RunOutcome::TextTooShort;
            }
        };

        sink.set_preview(&preview(&text, self.settings.preview_chars));
        sink.set_status(ANALYZING, StatusClass::Loading);

        match self.classifier.analyze(&text).await {
            Ok(result) => {
                tracing::info!(
                    is_phishing = result.is_phishing,
                    confidence_score = result.confidence_score,
                    "verdict received"
                );
                let (status, class) = verdict_status(&result);
                sink.set_status(&status, class);
                RunOutcome::ResultRendered(result)
            }
            Err(e) if e.is_connection_failure() => {
                tracing::error!(error = %e, "analysis request failed");
                sink.set_status(CONNECTION_ERROR, StatusClass::Neutral);
                sink.set_preview(&format!(
                    "Is the analysis server running?\nError: {}",
                    e
                ));
                RunOutcome::NetworkFailed(e)
            }
            Err(e) => {
                tracing::error!(error = %e, "analysis response rejected");
                sink.set_status(INVALID_RESPONSE, StatusClass::Neutral);
                sink.set_preview(&format!("Error: {}", e));
                RunOutcome::InvalidResponse(e)
            }
        }
    }
}

/// First `max_chars` chars of `text` followed by an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// Status line and class for a verdict.
///
/// `confidence_score` is the phishing probability in both branches, so both
/// use the same label.
pub fn verdict_status(result: &AnalysisResult) -> (String, StatusClass) {
    let score_line = format!("Phishing probability: {}%", result.confidence_score);
    if result.is_phishing {
        (
            format!("{}\n{}", PHISHING_DETECTED, score_line),
            StatusClass::Danger,
        )
    } else {
        (format!("{}\n{}", LOOKS_SAFE, score_line), StatusClass::Safe)
    }
}
