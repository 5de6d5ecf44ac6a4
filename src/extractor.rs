use scraper::{node::Element, ElementRef, Html, Selector};

/// Gmail renders the open message inside `div.a3s.aiL`.
pub const PRIMARY_BODY_SELECTOR: &str = ".a3s.aiL";

/// Outlook labels the reading pane body for screen readers.
pub const SECONDARY_BODY_SELECTOR: &str = r#"[aria-label="Message body"]"#;

const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "meta", "link",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Where the extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    PrimaryContainer,
    SecondaryContainer,
    Selection,
    PageText,
}

impl BodySource {
    pub fn label(&self) -> &'static str {
        match self {
            BodySource::PrimaryContainer => "primary message container",
            BodySource::SecondaryContainer => "message body landmark",
            BodySource::Selection => "user selection",
            BodySource::PageText => "full page text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub source: BodySource,
    pub text: String,
}

/// Extract the email body from a page using a cascade of strategies.
///
/// The first strategy that yields non-blank text wins. The last one (the
/// whole page) always succeeds, even if it returns an empty string.
pub fn extract_email_body(document: &Html, selection: Option<&str>) -> Extraction {
    // Strategy 1: Gmail message body
    if let Some(text) = extract_container_text(document, PRIMARY_BODY_SELECTOR) {
        return Extraction {
            source: BodySource::PrimaryContainer,
            text,
        };
    }

    // Strategy 2: Outlook message body landmark
    if let Some(text) = extract_container_text(document, SECONDARY_BODY_SELECTOR) {
        return Extraction {
            source: BodySource::SecondaryContainer,
            text,
        };
    }

    // Strategy 3: whatever the user highlighted, passed through untouched
    if let Some(selection) = selection.filter(|s| !s.trim().is_empty()) {
        return Extraction {
            source: BodySource::Selection,
            text: selection.to_string(),
        };
    }

    // Strategy 4: the whole visible page (noisy)
    Extraction {
        source: BodySource::PageText,
        text: page_text(document),
    }
}

/// Parse raw HTML and run [`extract_email_body`] over it.
pub fn extract_from_html(html: &str, selection: Option<&str>) -> Extraction {
    let document = Html::parse_document(html);
    extract_email_body(&document, selection)
}

/// Rendered text of the first element matching `selector_str`, if it is not blank.
fn extract_container_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let element = document.select(&selector).next()?;
    let text = rendered_text(element);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn page_text(document: &Html) -> String {
    match Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        Some(body) => rendered_text(body),
        None => rendered_text(document.root_element()),
    }
}

/// Approximate the text a browser would render for `element`.
///
/// Hidden and non-content elements are skipped, `<br>` becomes a newline and
/// block-level elements start on their own line. Inline whitespace runs
/// collapse to a single space, except inside `<pre>`. Non-breaking spaces
/// become plain spaces and never collapse.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let mut buffer = TextBuffer::default();
    if is_rendered(element.value()) {
        push_children(element, &mut buffer);
    }
    buffer.finish()
}

fn push_children(element: ElementRef<'_>, buffer: &mut TextBuffer) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            buffer.push_inline(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            push_element(child, buffer);
        }
    }
}

fn push_element(element: ElementRef<'_>, buffer: &mut TextBuffer) {
    if !is_rendered(element.value()) {
        return;
    }
    let name = element.value().name();
    if name == "br" {
        buffer.line_break();
    } else if BLOCK_ELEMENTS.contains(&name) {
        let preformatted = name == "pre";
        buffer.block_break();
        if preformatted {
            buffer.preformatted += 1;
        }
        push_children(element, buffer);
        if preformatted {
            buffer.preformatted -= 1;
        }
        buffer.block_break();
    } else if name == "td" || name == "th" {
        buffer.cell_break();
        push_children(element, buffer);
    } else {
        push_children(element, buffer);
    }
}

fn is_rendered(element: &Element) -> bool {
    if SKIPPED_ELEMENTS.contains(&element.name()) {
        return false;
    }
    if element.attr("hidden").is_some() {
        return false;
    }
    if element
        .attr("aria-hidden")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return false;
    }
    if let Some(style) = element.attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return false;
        }
    }
    true
}

const NBSP: char = '\u{a0}';

#[derive(Default)]
struct TextBuffer {
    out: String,
    pending_space: bool,
    /// Depth of enclosing `<pre>` elements.
    preformatted: usize,
}

impl TextBuffer {
    fn push_inline(&mut self, text: &str) {
        if self.preformatted > 0 {
            self.flush_space();
            self.out.extend(text.chars().map(|c| if c == NBSP { ' ' } else { c }));
            return;
        }

        for c in text.chars() {
            if c.is_whitespace() && c != NBSP {
                self.pending_space = true;
                continue;
            }
            self.flush_space();
            self.out.push(if c == NBSP { ' ' } else { c });
        }
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.out.is_empty() && !self.out.ends_with(['\n', '\t']) {
            self.out.push(' ');
        }
        self.pending_space = false;
    }

    fn line_break(&mut self) {
        self.pending_space = false;
        self.out.push('\n');
    }

    fn block_break(&mut self) {
        self.pending_space = false;
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn cell_break(&mut self) {
        self.pending_space = false;
        if !self.out.is_empty() && !self.out.ends_with(['\n', '\t']) {
            self.out.push('\t');
        }
    }

    fn finish(self) -> String {
        self.out.trim_matches('\n').to_string()
    }
}
