pub mod layout;
pub mod text;

pub use layout::{FormattedLayout, LayoutRow, Section, escape_html, format, format_result, format_versioned};
pub use text::{element_to_text, html_to_text, normalize_whitespace};
