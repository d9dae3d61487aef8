//! Markup-stage noise removal.
//!
//! Noise removal is a table of `(selector, action)` rules evaluated in order
//! against the parsed document. Structural rules drop scripts, landmarks and
//! common navigation/banner containers outright; the call-to-action rule drops
//! interactive elements only when their visible text matches the CTA vocabulary.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::parse::Document;

/// What a rule does with the elements its selector matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseAction {
    /// Detach every matching element.
    Remove,
    /// Detach matching elements whose visible text matches [`CTA_PATTERNS`].
    RemoveIfCallToAction,
}

/// One entry of the noise rule table.
#[derive(Debug, Clone, Copy)]
pub struct NoiseRule {
    pub selector: &'static str,
    pub action: NoiseAction,
}

const fn remove(selector: &'static str) -> NoiseRule {
    NoiseRule { selector, action: NoiseAction::Remove }
}

/// Noise vocabulary, applied top to bottom.
pub const NOISE_RULES: &[NoiseRule] = &[
    remove("script, style, noscript, template, svg, iframe, form"),
    remove("header, nav, aside, footer"),
    remove(".header, .nav, .navbar, .menu, .sidebar, .breadcrumb"),
    remove(".footer, .subscribe, .newsletter, .cookie, .banner"),
    remove(r#"[role="banner"], [role="navigation"], [role="contentinfo"]"#),
    NoiseRule { selector: r#"a, button, input[type="submit"], .btn"#, action: NoiseAction::RemoveIfCallToAction },
];

/// Call-to-action vocabulary for anchors and buttons.
///
/// Distinct from the line-level rules in [`crate::postprocess`]: these see
/// interactive elements before text conversion, those see rendered lines after.
pub const CTA_PATTERNS: &[&str] = &[
    r"(?i)order\s*now",
    r"(?i)buy\s*now",
    r"(?i)add\s*to\s*cart",
    r"(?i)checkout",
    r"(?i)discount",
    r"(?i)coupon",
    r"(?i)shipping",
    r"(?i)limited\s*time",
    r"(?i)save\s*\d+%",
];

static CTA_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CTA_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("CTA pattern should compile"))
        .collect()
});

static COMPILED_RULES: LazyLock<Vec<(Selector, NoiseAction)>> = LazyLock::new(|| {
    NOISE_RULES
        .iter()
        .map(|rule| (Selector::parse(rule.selector).expect("noise selector should parse"), rule.action))
        .collect()
});

/// Returns true when `text` (trimmed) reads like a call to action.
pub fn is_call_to_action(text: &str) -> bool {
    let text = text.trim();
    CTA_RES.iter().any(|re| re.is_match(text))
}

fn element_matches(action: NoiseAction, el: &ElementRef<'_>) -> bool {
    match action {
        NoiseAction::Remove => true,
        NoiseAction::RemoveIfCallToAction => is_call_to_action(&el.text().collect::<String>()),
    }
}

/// Applies [`NOISE_RULES`] to the document body. Returns the number of removed elements.
pub fn strip_noise(doc: &mut Document) -> usize {
    let mut removed = 0;
    for (selector, action) in COMPILED_RULES.iter() {
        let action = *action;
        removed += doc.remove_selected(selector, |el| element_matches(action, el));
    }
    debug!(removed, "noise elements removed");
    removed
}
