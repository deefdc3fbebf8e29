//! Body rendering. The pipeline only sees the [`Renderer`] trait; the
//! default implementation hands Markdown to pulldown-cmark.

use pulldown_cmark::{html, Options, Parser};

/// Turns a document body into its rendered (HTML) form.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn render(&self, source: &str) -> String {
        self(source)
    }
}

/// CommonMark renderer with the usual GitHub-flavoured extensions
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        Self { options }
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options);
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading() {
        let html = MarkdownRenderer::new().render("# Hi");
        assert_eq!(html, "<h1>Hi</h1>\n");
    }

    #[test]
    fn test_extensions_enabled() {
        let renderer = MarkdownRenderer::new();
        assert!(renderer.render("~~gone~~").contains("<del>gone</del>"));
        assert!(renderer
            .render("| a | b |\n|---|---|\n| 1 | 2 |\n")
            .contains("<table>"));
    }

    #[test]
    fn test_deterministic() {
        let renderer = MarkdownRenderer::new();
        let source = "Some *emphasis* and a [link](https://example.com).\n\n- one\n- two\n";
        assert_eq!(renderer.render(source), renderer.render(source));
    }

    #[test]
    fn test_closure_renderer() {
        let upper = |s: &str| s.to_uppercase();
        assert_eq!(Renderer::render(&upper, "abc"), "ABC");
    }
}
