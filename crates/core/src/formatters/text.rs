use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::parse::Document;

/// Elements whose closing tag ends a paragraph (followed by a blank line).
const PARAGRAPH_ELEMENTS: [&str; 10] = ["p", "div", "section", "article", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements whose closing tag ends a line.
const LINE_ELEMENTS: [&str; 2] = ["li", "tr"];

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("SPACE_RUN should compile"));
static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("TRAILING_SPACE should compile"));
static LEADING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ +").expect("LEADING_SPACE should compile"));
static BLANK_LINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("BLANK_LINE_RUN should compile"));

/// Convert an HTML document to normalized plain text.
///
/// Only the `<body>` subtree is rendered. No noise removal is applied; see
/// [`crate::extract::extract_from_html`] for the full cleaning pipeline.
pub fn html_to_text(html: &str) -> String {
    let doc = Document::parse(html);
    element_to_text(doc.body())
}

/// Render an element subtree to normalized plain text.
///
/// Text nodes arrive with entities already decoded by the parser. Paragraph-level
/// closing tags are followed by a blank line, list items and table rows by a
/// newline, and `<br>` becomes a newline. Indentation left over from the source
/// markup is dropped from the start of each line.
pub fn element_to_text(element: ElementRef<'_>) -> String {
    let mut output = String::new();
    render(element, &mut output);
    let normalized = normalize_whitespace(&output);
    LEADING_SPACE.replace_all(&normalized, "").trim().to_string()
}

fn render(element: ElementRef<'_>, output: &mut String) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if name == "br" {
                output.push('\n');
                continue;
            }

            render(child_el, output);

            if PARAGRAPH_ELEMENTS.contains(&name) {
                output.push_str("\n\n");
            } else if LINE_ELEMENTS.contains(&name) {
                output.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            output.push_str(text);
        }
    }
}

/// Normalize whitespace without touching line structure.
///
/// Tabs are removed, non-breaking spaces become spaces, space runs collapse to
/// one, trailing spaces are trimmed per line and blank-line runs collapse to a
/// single blank line. The result never contains three consecutive newlines.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.replace('\t', "").replace('\u{00A0}', " ");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = TRAILING_SPACE.replace_all(&text, "");
    BLANK_LINE_RUN.replace_all(&text, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_html_to_text_block_structure() {
        let html = "<h1>Title</h1><p>Line&nbsp;one</p><div>Line two<br>more</div><ul><li>Item 1</li><li>Item  2</li></ul>";
        assert_eq!(
            html_to_text(html),
            "Title\n\nLine one\n\nLine two\nmore\n\nItem 1\nItem 2"
        );
    }

    #[test]
    fn test_html_to_text_decodes_entities() {
        let html = "<p>Fish &amp; chips &lt;3 &quot;fresh&quot; &#39;daily&#39;</p>";
        assert_eq!(html_to_text(html), "Fish & chips <3 \"fresh\" 'daily'");
    }

    #[test]
    fn test_html_to_text_only_body() {
        let html = "<html><head><title>Head title</title></head><body><p>Body</p>\t</body></html>";
        assert_eq!(html_to_text(html), "Body");
    }

    #[test]
    fn test_html_to_text_table_rows() {
        let html = "<table><tr><td>A</td><td>B</td></tr><tr><td>C</td></tr></table>";
        assert_eq!(html_to_text(html), "AB\nC");
    }

    #[test]
    fn test_html_to_text_indented_markup() {
        let html = "<body>\n    <section>\n        <h2>Heading</h2>\n        <p>Body text</p>\n    </section>\n</body>";
        assert_eq!(html_to_text(html), "Heading\n\nBody text");
    }

    #[test]
    fn test_leading_space_dropped_only_for_markup() {
        assert_eq!(html_to_text("<div>\n  <p>Kept</p>\n  <p>Lines</p>\n</div>"), "Kept\n\nLines");
        assert_eq!(normalize_whitespace("line\n  indented"), "line\n indented");
    }

    #[test]
    fn test_normalize_whitespace_rules() {
        assert_eq!(normalize_whitespace("a\t\tb"), "ab");
        assert_eq!(normalize_whitespace("a\u{00A0}\u{00A0}b"), "a b");
        assert_eq!(normalize_whitespace("a    b\nc  d"), "a b\nc d");
        assert_eq!(normalize_whitespace("line   \nnext"), "line\nnext");
        assert_eq!(normalize_whitespace("a\r\nb"), "a\nb");
    }

    #[rstest]
    #[case("a\n\n\n\nb")]
    #[case("a\n \n \n \nb")]
    #[case("a\n\t\n\t\n\tb")]
    #[case("a\n\u{00A0}\n\u{00A0}\n\nb")]
    #[case("\n\n\n\n")]
    fn test_normalize_never_leaves_three_newlines(#[case] input: &str) {
        let out = normalize_whitespace(input);
        assert!(!out.contains("\n\n\n"), "{out:?}");
    }

    #[test]
    fn test_normalize_whitespace_idempotent() {
        let input = "a \t b\n\n\n\u{00A0}c  \n\n\n\nd";
        let once = normalize_whitespace(input);
        assert_eq!(normalize_whitespace(&once), once);
    }
}
