//! Numbered-section markdown to HTML table.
//!
//! Generated content is split on headings shaped like `## **<n>. <title>**`.
//! Each section becomes one table row. Which formatting rules apply to a
//! section is decided by the [`SectionSchema`] of the content's prompt version,
//! never by the layout name.
//!
//! # Example
//!
//! ```rust
//! use pagecraft_core::Layout;
//! use pagecraft_core::formatters::layout::render;
//! use pagecraft_core::rewrite::PromptVersion;
//!
//! let markdown = "## **1. Short Headline**\nWalk further\n\n## **2. Body**\n* one\n* two";
//! let layout = render(markdown, Layout::Interstitial, &PromptVersion::V2InterstitialStructured);
//!
//! assert_eq!(layout.rows.len(), 2);
//! assert_eq!(layout.rows[0].header, "1. Short Headline");
//! assert!(layout.rows[1].body_html.contains("<li>one</li>"));
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::rewrite::{Layout, PromptVersion, RewriteResult, SectionSchema};

/// Header of the single row emitted when no headings are found.
pub const FALLBACK_HEADER: &str = "AI Output";

const TH_STYLE: &str = "vertical-align:top;white-space:nowrap;padding:8px;border:1px solid #e5e7eb;background:#f8fafc";
const TD_STYLE: &str = "padding:8px;border:1px solid #e5e7eb";

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]*\*\*(\d+)\.[^*\n]*?[ \t]*(.*?)[ \t]*\*\*[ \t]*$").expect("HEADING should compile")
});
static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^---+$").expect("RULE_LINE should compile"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\*\s+(.*)$").expect("BULLET should compile"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\*\*(.*?)\*\*").expect("BOLD should compile"));
static BOLD_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\*(.+?)\*\*\s*$").expect("BOLD_TITLE should compile"));
static BULLET_BOLD_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\s+\*\*(.+?)\*\*\s*$").expect("BULLET_BOLD_TITLE should compile"));
static STRUCTURAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\*\s+|\*\*|##|-\s+)").expect("STRUCTURAL_LINE should compile"));

/// One detected section of generated markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub number: &'a str,
    pub title: &'a str,
    /// Trimmed text between this heading and the next.
    pub body: &'a str,
}

impl Section<'_> {
    pub fn label(&self) -> String {
        format!("{}. {}", self.number, self.title)
    }
}

/// One table row. `header` is plain text; `body_html` is ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRow {
    pub header: String,
    pub body_html: String,
}

/// Rendered rows plus the banner they are wrapped in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLayout {
    pub layout: Layout,
    pub rows: Vec<LayoutRow>,
    /// True when no headings were detected and the single row holds the whole input.
    pub is_fallback: bool,
}

impl FormattedLayout {
    pub fn banner_title(&self) -> &'static str {
        banner_title(self.layout)
    }

    /// Table rows only, without the banner.
    pub fn rows_html(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                format!(
                    "<tr><th style=\"{TH_STYLE}\">{}</th><td style=\"{TD_STYLE}\">{}</td></tr>",
                    escape_html(&row.header),
                    row.body_html
                )
            })
            .collect()
    }

    pub fn to_html(&self) -> String {
        wrap_table(&self.rows_html(), self.banner_title())
    }
}

pub fn banner_title(layout: Layout) -> &'static str {
    match layout {
        Layout::Interstitial => "AI Interstitial (latest)",
        Layout::Advertorial => "AI Advertorial (latest)",
        Layout::Generic => "AI Output (latest)",
    }
}

/// Formats markdown generated with the current prompt version for `layout`.
pub fn format(markdown: &str, layout: Layout) -> String {
    format_versioned(markdown, layout, &PromptVersion::latest_for(layout))
}

/// Formats markdown using the schema pinned by `version`.
pub fn format_versioned(markdown: &str, layout: Layout, version: &PromptVersion) -> String {
    render(markdown, layout, version).to_html()
}

/// Formats a stored result by its recorded prompt version.
pub fn format_result(result: &RewriteResult, layout: Layout) -> String {
    format_versioned(&result.content, layout, &result.version())
}

/// Splits normalized markdown into sections, in encounter order.
pub fn parse_sections(text: &str) -> Vec<Section<'_>> {
    let headings: Vec<_> = HEADING.captures_iter(text).collect();
    let mut sections = Vec::with_capacity(headings.len());

    for (idx, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(number), Some(title)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let end = headings.get(idx + 1).and_then(|next| next.get(0)).map_or(text.len(), |m| m.start());
        sections.push(Section { number: number.as_str(), title: title.as_str(), body: text[whole.end()..end].trim() });
    }

    sections
}

/// Parses and renders markdown into rows. Never fails.
pub fn render(markdown: &str, layout: Layout, version: &PromptVersion) -> FormattedLayout {
    let text = markdown.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.trim();
    let schema = version.schema();

    let sections = parse_sections(text);
    if sections.is_empty() {
        let row = LayoutRow { header: FALLBACK_HEADER.to_string(), body_html: nl2br(&escape_html(text)) };
        return FormattedLayout { layout, rows: vec![row], is_fallback: true };
    }

    let rows = sections
        .iter()
        .map(|section| LayoutRow { header: section.label(), body_html: section_body_html(section, &schema) })
        .collect();

    FormattedLayout { layout, rows, is_fallback: false }
}

fn section_body_html(section: &Section<'_>, schema: &SectionSchema) -> String {
    let dense = schema.dense_feature_section.is_some_and(|n| section.number.parse::<u32>().ok() == Some(n));

    let body = RULE_LINE.replace_all(section.body, "");
    let mut body = body.trim().to_string();

    if dense {
        body = pair_feature_lines(&body, schema.label_prefixes);
    }

    let list_style = if dense { ListStyle::COMPACT } else { ListStyle::STANDARD };
    let body = bullets_to_html(&body, list_style);
    let body = BOLD.replace_all(&body, "<strong>$1</strong>");
    let body = italicize(&body);

    if body.contains("<ul") || body.contains("<ol") { body } else { nl2br(&body) }
}

#[derive(Debug)]
enum PairState<'a> {
    Scanning,
    /// A bold title was seen; blank lines after it are held until the next content line.
    PairingLookahead { title: &'a str, held: Vec<&'a str> },
}

/// Merges a bold title line and the description line after it into one bullet.
///
/// `**Title**` or `* **Title**`, followed (after any blank lines) by a plain line,
/// becomes `* **Title** description`. A following heading, bullet, bold line,
/// dash item or one of `label_prefixes` (case-insensitive) leaves both untouched.
pub fn pair_feature_lines(text: &str, label_prefixes: &[&str]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut state = PairState::Scanning;

    for line in text.split('\n') {
        if let PairState::PairingLookahead { title, held } = &mut state {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                held.push(line);
                continue;
            }
            if is_description(trimmed, label_prefixes) {
                out.push(format!("* **{title}** {trimmed}"));
                state = PairState::Scanning;
                continue;
            }
            out.extend(held.drain(..).map(str::to_string));
            state = PairState::Scanning;
        }

        match feature_title(line) {
            Some(title) => state = PairState::PairingLookahead { title, held: vec![line] },
            None => out.push(line.to_string()),
        }
    }

    if let PairState::PairingLookahead { held, .. } = state {
        out.extend(held.into_iter().map(str::to_string));
    }

    out.join("\n")
}

fn feature_title(line: &str) -> Option<&str> {
    BOLD_TITLE
        .captures(line)
        .or_else(|| BULLET_BOLD_TITLE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn is_description(trimmed: &str, label_prefixes: &[&str]) -> bool {
    !STRUCTURAL_LINE.is_match(trimmed)
        && !label_prefixes.iter().any(|label| {
            trimmed.get(..label.len()).is_some_and(|head| head.eq_ignore_ascii_case(label))
        })
}

#[derive(Debug, Clone, Copy)]
struct ListStyle {
    ul: &'static str,
    li: Option<&'static str>,
}

impl ListStyle {
    const STANDARD: ListStyle = ListStyle { ul: "margin:0 0 0.5rem 1.25rem;", li: None };
    const COMPACT: ListStyle = ListStyle { ul: "list-style:none;margin:0;padding-left:0", li: Some("margin:2px 0") };
}

/// Escapes every line and turns runs of `* ` lines into `<ul>` lists.
fn bullets_to_html(text: &str, style: ListStyle) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_list = false;

    for line in text.split('\n') {
        if let Some(item) = BULLET.captures(line).and_then(|caps| caps.get(1)) {
            if !in_list {
                out.push(format!("<ul style=\"{}\">", style.ul));
                in_list = true;
            }
            let open = match style.li {
                Some(li) => format!("<li style=\"{li}\">"),
                None => "<li>".to_string(),
            };
            out.push(format!("{open}{}</li>", escape_html(item.as_str().trim())));
        } else {
            if in_list {
                out.push("</ul>".to_string());
                in_list = false;
            }
            out.push(escape_html(line));
        }
    }
    if in_list {
        out.push("</ul>".to_string());
    }

    out.join("\n")
}

/// Wraps `*span*` in `<em>`.
///
/// The opening asterisk must not follow another asterisk or precede whitespace;
/// the closing asterisk is the next one and must not precede another asterisk.
fn italicize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '*'
            && (i == 0 || chars[i - 1] != '*')
            && let Some(&next) = chars.get(i + 1)
            && next != '*'
            && !next.is_whitespace()
            && let Some(offset) = chars[i + 1..].iter().position(|&c| c == '*')
        {
            let close = i + 1 + offset;
            if chars.get(close + 1) != Some(&'*') {
                out.push_str("<em>");
                out.extend(&chars[i + 1..close]);
                out.push_str("</em>");
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Escapes `& < > " '` for HTML text and attribute contexts.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Inserts `<br />` before every newline.
pub fn nl2br(text: &str) -> String {
    text.replace('\n', "<br />\n")
}

fn wrap_table(rows_html: &str, title: &str) -> String {
    format!(
        concat!(
            "<div style=\"border:1px solid #f59e0b;background:#fffbeb;border-radius:8px;padding:10px;margin:10px 0\">",
            "<div style=\"font-weight:600;color:#92400e;margin-bottom:8px;display:flex;align-items:center;gap:6px\">",
            "<span style=\"display:inline-flex;align-items:center;justify-content:center;width:20px;height:20px;",
            "border-radius:50%;background:#fbbf24;color:#78350f;font-size:12px\">AI</span>{title}</div>",
            "<div style=\"overflow:auto\">",
            "<table style=\"width:100%;border-collapse:collapse;background:#fff;color:#000\">{rows}</table>",
            "</div></div>"
        ),
        title = escape_html(title),
        rows = rows_html
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v2() -> PromptVersion {
        PromptVersion::V2InterstitialStructured
    }

    #[test]
    fn test_fallback_without_headings() {
        let layout = render("Plain <output>\nsecond line", Layout::Advertorial, &PromptVersion::V1);

        assert!(layout.is_fallback);
        assert_eq!(layout.rows.len(), 1);
        assert_eq!(layout.rows[0].header, FALLBACK_HEADER);
        assert_eq!(layout.rows[0].body_html, "Plain &lt;output&gt;<br />\nsecond line");
    }

    #[test]
    fn test_fallback_on_empty_input() {
        let layout = render("   ", Layout::Interstitial, &v2());
        assert!(layout.is_fallback);
        assert_eq!(layout.rows[0].body_html, "");
    }

    #[test]
    fn test_rows_in_encounter_order() {
        let markdown = "## **3. Third**\nc\n## **1. First**\na\n## **2. Second**\nb";
        let headers: Vec<_> = render(markdown, Layout::Interstitial, &v2()).rows.into_iter().map(|r| r.header).collect();
        assert_eq!(headers, ["3. Third", "1. First", "2. Second"]);
    }

    #[test]
    fn test_duplicate_numbers_keep_every_row() {
        let markdown = "## **1. One**\na\n## **1. Again**\nb";
        let layout = render(markdown, Layout::Interstitial, &v2());
        assert_eq!(layout.rows.len(), 2);
        assert_eq!(layout.rows[1].header, "1. Again");
    }

    #[rstest]
    #[case("## **1. Short Headline**", Some(("1", "Short Headline")))]
    #[case("##**12. Testimonials**  ", Some(("12", "Testimonials")))]
    #[case("## **7. Meet {{productName}}**", Some(("7", "Meet {{productName}}")))]
    #[case("## **Required sections**", None)]
    #[case("### **1. Too deep**", None)]
    #[case("## 1. Not bold", None)]
    #[case("Text ## **1. Inline**", None)]
    fn test_heading_shape(#[case] line: &str, #[case] expected: Option<(&str, &str)>) {
        let sections = parse_sections(line);
        assert_eq!(sections.first().map(|s| (s.number, s.title)), expected);
    }

    #[test]
    fn test_section_bodies_are_trimmed_and_bounded() {
        let text = "## **1. A**\n\n  body a  \n\n## **2. B**\nbody b\n";
        let sections = parse_sections(text);
        assert_eq!(sections[0].body, "body a");
        assert_eq!(sections[1].body, "body b");
    }

    #[test]
    fn test_plain_body_gets_line_breaks_and_emphasis() {
        let markdown = "## **2. The X-Factor**\n---\n**Sub-Title:** Light & *springy*\n**Body:** Built for \"long\" days";
        let layout = render(markdown, Layout::Interstitial, &v2());

        assert_eq!(
            layout.rows[0].body_html,
            "<strong>Sub-Title:</strong> Light &amp; <em>springy</em><br />\n<strong>Body:</strong> Built for &quot;long&quot; days"
        );
    }

    #[test]
    fn test_bullets_become_list_without_line_breaks() {
        let markdown = "## **3. Benefits**\nIntro\n* Soft heel\n* Arch *support*\nOutro";
        let body = &render(markdown, Layout::Interstitial, &v2()).rows[0].body_html;

        assert_eq!(
            body,
            "Intro\n<ul style=\"margin:0 0 0.5rem 1.25rem;\">\n<li>Soft heel</li>\n<li>Arch <em>support</em></li>\n</ul>\nOutro"
        );
        assert!(!body.contains("<br"));
    }

    #[test]
    fn test_dense_feature_section_pairs_and_compacts() {
        let markdown = "## **10. Features (with Short Sentences)**\n**Features Body:** Everything you need\n* **Cushioning**\n  Absorbs every step.\n\n**Breathable**\n\nStays cool all day.";
        let body = &render(markdown, Layout::Interstitial, &v2()).rows[0].body_html;

        assert!(body.contains("<ul style=\"list-style:none;margin:0;padding-left:0\">"));
        assert!(body.contains("<li style=\"margin:2px 0\"><strong>Cushioning</strong> Absorbs every step.</li>"));
        assert!(body.contains("<li style=\"margin:2px 0\"><strong>Breathable</strong> Stays cool all day.</li>"));
        assert!(body.starts_with("<strong>Features Body:</strong> Everything you need"));
    }

    #[test]
    fn test_dense_section_only_under_structured_version() {
        let markdown = "## **10. Features**\n* **Cushioning**\nAbsorbs every step.";
        let generic = &render(markdown, Layout::Interstitial, &PromptVersion::V1).rows[0].body_html;

        assert!(generic.contains("<ul style=\"margin:0 0 0.5rem 1.25rem;\">"));
        assert!(generic.contains("<li><strong>Cushioning</strong></li>"));
        assert!(generic.contains("Absorbs every step."));
    }

    #[test]
    fn test_pairing_state_machine() {
        let labels = SectionSchema::INTERSTITIAL_V2.label_prefixes;

        assert_eq!(pair_feature_lines("**Grip**\nHolds firm.", labels), "* **Grip** Holds firm.");
        assert_eq!(pair_feature_lines("* **Grip**\n\n\nHolds firm.", labels), "* **Grip** Holds firm.");
        assert_eq!(pair_feature_lines("**Grip**\n* next bullet", labels), "**Grip**\n* next bullet");
        assert_eq!(pair_feature_lines("**Grip**\n\n## **11. Next**", labels), "**Grip**\n\n## **11. Next**");
        assert_eq!(pair_feature_lines("**Grip**\n- dash item", labels), "**Grip**\n- dash item");
        assert_eq!(pair_feature_lines("**Grip**\nfeatures body: x", labels), "**Grip**\nfeatures body: x");
        assert_eq!(pair_feature_lines("**Grip**\n\n", labels), "**Grip**\n\n");
    }

    #[test]
    fn test_pairing_retries_on_following_title() {
        let labels = SectionSchema::INTERSTITIAL_V2.label_prefixes;
        assert_eq!(
            pair_feature_lines("**A**\n**B**\nDescription", labels),
            "**A**\n* **B** Description"
        );
    }

    #[rstest]
    #[case("*word*", "<em>word</em>")]
    #[case("a *b c* d", "a <em>b c</em> d")]
    #[case("* not italic", "* not italic")]
    #[case("**x", "**x")]
    #[case("*open only", "*open only")]
    #[case("2 * 3 * 4", "2 * 3 * 4")]
    #[case("*a**", "*a**")]
    #[case("*a* and *b*", "<em>a</em> and <em>b</em>")]
    fn test_italicize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(italicize(input), expected);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">Tom's & co</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom&#039;s &amp; co&lt;/a&gt;");
    }

    #[rstest]
    #[case(Layout::Interstitial, "AI Interstitial (latest)")]
    #[case(Layout::Advertorial, "AI Advertorial (latest)")]
    #[case(Layout::Generic, "AI Output (latest)")]
    fn test_banner_title(#[case] layout: Layout, #[case] title: &str) {
        let html = format("## **1. A**\nb", layout);
        assert!(html.contains(title));
        assert!(html.contains("<table"));
        assert!(html.contains(&format!("<th style=\"{TH_STYLE}\">1. A</th>")));
    }

    #[test]
    fn test_format_result_dispatches_on_stored_version() {
        let result = RewriteResult {
            content: "## **10. Features**\n**Grip**\nHolds firm.".into(),
            model_id: "gpt-4o-mini".into(),
            tokens_input: None,
            tokens_output: None,
            temperature: 0.7,
            provider: "openai".into(),
            prompt_version: "v1".into(),
        };

        let html = format_result(&result, Layout::Interstitial);
        assert!(!html.contains("list-style:none"));
        assert!(html.contains("<strong>Grip</strong><br />"));
    }

    #[test]
    fn test_header_is_escaped() {
        let html = format("## **4. Q&A <b>**\nx", Layout::Generic);
        assert!(html.contains(">4. Q&amp;A &lt;b&gt;</th>"));
    }

    #[test]
    fn test_crlf_input() {
        let layout = render("## **1. A**\r\nline one\r\nline two", Layout::Interstitial, &v2());
        assert_eq!(layout.rows[0].body_html, "line one<br />\nline two");
    }
}
