//! Extract the email body from a webmail page, send it to a phishing
//! classifier and show the verdict.

pub mod analysis;
pub mod app;
pub mod config;
pub mod extractor;
pub mod host;
pub mod popup;
pub mod ui;

pub use analysis::{AnalysisError, AnalysisResult, Classifier, HttpClassifier};
pub use config::Config;
pub use extractor::{extract_email_body, BodySource, Extraction};
pub use host::{Browser, FrameResult, HostError, PageHost, Tab, TabLocation};
pub use popup::{PopupController, PopupSettings, RunOutcome, StatusClass, StatusSink};
