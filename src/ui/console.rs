use crate::popup::{StatusClass, StatusSink};
use std::io::Write;

/// Writes popup updates as plain lines, for use outside a terminal UI.
pub struct ConsoleSink<W: Write> {
    out: W,
    width: usize,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width: width.max(20),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_block(&mut self, label: &str, text: &str) {
        let indent = " ".repeat(label.len() + 3);

        for (i, paragraph) in text.lines().enumerate() {
            let prefix = if i == 0 {
                format!("[{}] ", label)
            } else {
                indent.clone()
            };
            let options = textwrap::Options::new(self.width)
                .initial_indent(&prefix)
                .subsequent_indent(&indent);
            let wrapped = textwrap::fill(paragraph, options);
            // Write failures are logged, never fatal
            if let Err(e) = writeln!(self.out, "{}", wrapped) {
                tracing::warn!(error = %e, "failed to write popup output");
                return;
            }
        }
    }
}

impl<W: Write> StatusSink for ConsoleSink<W> {
    fn set_status(&mut self, text: &str, class: StatusClass) {
        self.write_block(class.as_str(), text);
    }

    fn set_preview(&mut self, text: &str) {
        self.write_block("preview", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_status_with_class_label() {
        let mut sink = ConsoleSink::new(Vec::new(), 80);
        sink.set_status("⚠️ PHISHING DETECTED\nPhishing probability: 87%", StatusClass::Danger);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "[danger] ⚠️ PHISHING DETECTED\n         Phishing probability: 87%\n"
        );
    }

    #[test]
    fn test_wraps_long_preview() {
        let mut sink = ConsoleSink::new(Vec::new(), 30);
        sink.set_preview("Your account has been suspended please verify your identity");

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("[preview] Your account has"));
        assert!(out.lines().count() > 1);
        assert!(out.lines().skip(1).all(|line| line.starts_with("          ")));
    }
}
