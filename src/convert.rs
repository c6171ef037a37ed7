use pulldown_cmark::{Options, Parser, html};

pub const DEFAULT_TEXT_WIDTH: usize = 80;
const MIN_TEXT_WIDTH: usize = 10;

/// Turns one body kind into the other. Both directions are total.
pub trait BodyConverter: Send + Sync {
    fn text_to_html(&self, text: &str) -> String;
    fn html_to_text(&self, html: &str) -> String;
}

/// Renders text bodies as Markdown and flattens HTML bodies with html2text.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    text_width: usize,
}

impl MarkdownConverter {
    pub fn new() -> Self {
        Self::with_width(DEFAULT_TEXT_WIDTH)
    }

    pub fn with_width(text_width: usize) -> Self {
        Self {
            text_width: text_width.max(MIN_TEXT_WIDTH),
        }
    }

    pub fn text_width(&self) -> usize {
        self.text_width
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyConverter for MarkdownConverter {
    fn text_to_html(&self, text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(text, options);

        let mut html_output = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }

    fn html_to_text(&self, html: &str) -> String {
        let text = html2text::from_read(html.as_bytes(), self.text_width);
        text.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_to_html_paragraphs() {
        let converter = MarkdownConverter::new();
        let html = converter.text_to_html("Line one\n\nLine two");
        assert_eq!(html, "<p>Line one</p>\n<p>Line two</p>\n");
    }

    #[test]
    fn test_text_to_html_markdown_features() {
        let converter = MarkdownConverter::new();
        let html = converter.text_to_html("# Welcome\n\nThis is **bold** and ~~gone~~.");
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_html_to_text_strips_markup() {
        let converter = MarkdownConverter::new();
        let text = converter.html_to_text("<p>Hello <b>there</b></p><p>Second paragraph</p>");
        assert!(!text.contains('<'));
        assert!(text.contains("Hello"));
        assert!(text.contains("there"));
        assert!(text.contains("Second paragraph"));
        assert!(text.find("Hello").unwrap() < text.find("Second paragraph").unwrap());
    }

    #[test]
    fn test_html_to_text_respects_width() {
        let converter = MarkdownConverter::with_width(20);
        let text = converter
            .html_to_text("<p>one two three four five six seven eight nine ten eleven</p>");
        assert!(text.lines().count() > 1);
        assert!(text.lines().all(|line| line.chars().count() <= 20));
    }

    #[test]
    fn test_narrow_width_is_clamped() {
        assert_eq!(MarkdownConverter::with_width(0).text_width(), 10);
    }
}
