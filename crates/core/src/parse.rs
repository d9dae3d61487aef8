//! HTML parsing and DOM pruning.
//!
//! This module provides the [`Document`] type, a thin wrapper over
//! `scraper::Html` that adds the two operations the content cleaner needs:
//! title lookup and selector-driven node removal.
//!
//! # Example
//!
//! ```rust
//! use pagecraft_core::parse::Document;
//!
//! let html = "<html><head><title> Test </title></head><body><nav>Menu</nav><p>Hello</p></body></html>";
//! let mut doc = Document::parse(html);
//! assert_eq!(doc.title(), Some("Test".to_string()));
//!
//! let removed = doc.remove_matching("nav", |_| true).unwrap();
//! assert_eq!(removed, 1);
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{PagecraftError, Result};

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// The HTML5 parser recovers from malformed markup, so parsing itself never fails.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Gets the raw HTML representation.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Gets the trimmed text of the `<title>` element.
    ///
    /// Returns `None` when there is no title element or it is blank.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Gets the `<body>` element, or the root element when there is none.
    pub fn body(&self) -> ElementRef<'_> {
        Selector::parse("body")
            .ok()
            .and_then(|selector| self.html.select(&selector).next())
            .unwrap_or_else(|| self.html.root_element())
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagecraftError::Config`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).collect())
    }

    /// Detaches every element inside `<body>` that matches `selector` and
    /// satisfies `predicate`. Returns the number of detached elements.
    pub fn remove_matching<F>(&mut self, selector: &str, predicate: F) -> Result<usize>
    where
        F: Fn(&ElementRef<'_>) -> bool,
    {
        let sel = parse_selector(selector)?;
        Ok(self.remove_selected(&sel, predicate))
    }

    /// Same as [`Document::remove_matching`] with a precompiled selector.
    pub fn remove_selected<F>(&mut self, selector: &Selector, predicate: F) -> usize
    where
        F: Fn(&ElementRef<'_>) -> bool,
    {
        let ids: Vec<_> = self
            .body()
            .select(selector)
            .filter(|el| predicate(el))
            .map(|el| el.id())
            .collect();

        let mut removed = 0;
        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
        removed
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PagecraftError::Config(format!("Invalid selector {selector:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>
                Test Page
            </title>
        </head>
        <body>
            <nav>Menu</nav>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2 <a href="/x">Buy now</a></p>
        </body>
        </html>
    "#;

    #[test]
    fn test_title_is_trimmed() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_missing_or_blank_title() {
        assert_eq!(Document::parse("<p>No title</p>").title(), None);
        assert_eq!(Document::parse("<title>   </title><p>x</p>").title(), None);
    }

    #[test]
    fn test_body_fallback() {
        let doc = Document::parse("<p>fragment</p>");
        assert_eq!(doc.body().value().name(), "body");
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("p.content").unwrap();
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML);
        assert!(matches!(doc.select("[[invalid"), Err(PagecraftError::Config(_))));
    }

    #[test]
    fn test_remove_matching_with_predicate() {
        let mut doc = Document::parse(SAMPLE_HTML);
        let removed = doc
            .remove_matching("a", |el| el.text().collect::<String>().contains("Buy"))
            .unwrap();
        assert_eq!(removed, 1);

        let removed = doc.remove_matching("nav", |_| true).unwrap();
        assert_eq!(removed, 1);

        let text: String = doc.body().text().collect();
        assert!(!text.contains("Buy now"));
        assert!(!text.contains("Menu"));
        assert!(text.contains("Paragraph 2"));
    }
}
