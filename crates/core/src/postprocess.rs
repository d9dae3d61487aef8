//! Text-stage boilerplate removal.
//!
//! Boilerplate removal is an ordered list of [`TextRule`]s. `Strip` rules delete
//! matching spans from the whole text; `DropLine` rules delete every line they
//! match, newline included. Rules run top to bottom so that, for example,
//! decorative symbols are gone before script blocks and separator-only lines
//! are detected.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::formatters::text::normalize_whitespace;

/// What a rule does with a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Remove the matched span, keep the rest of the text.
    Strip,
    /// Remove the whole line containing a match.
    DropLine,
}

/// One boilerplate rule, kept as data so each can be tested on its own.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub action: RuleAction,
}

const fn strip(name: &'static str, pattern: &'static str) -> TextRule {
    TextRule { name, pattern, action: RuleAction::Strip }
}

const fn drop_line(name: &'static str, pattern: &'static str) -> TextRule {
    TextRule { name, pattern, action: RuleAction::DropLine }
}

const MONTH_DAY_DATE: &str = r"(?i)\b(Jan(uary)?|Feb(ruary)?|Mar(ch)?|Apr(il)?|May|Jun(e)?|Jul(y)?|Aug(ust)?|Sep(t(ember)?)?|Oct(ober)?|Nov(ember)?|Dec(ember)?)\s+\d{1,2}(st|nd|rd|th)?(,\s*\d{2,4})?\b";

const DAY_MONTH_DATE: &str = r"(?i)\b\d{1,2}(st|nd|rd|th)?\s+(Jan(uary)?|Feb(ruary)?|Mar(ch)?|Apr(il)?|May|Jun(e)?|Jul(y)?|Aug(ust)?|Sep(t(ember)?)?|Oct(ober)?|Nov(ember)?|Dec(ember)?)(,?\s*\d{2,4})?\b";

/// The boilerplate vocabulary, in application order.
pub const TEXT_RULES: &[TextRule] = &[
    strip(
        "decorative_symbols",
        r"[\x{1F1E6}-\x{1F1FF}\x{1F300}-\x{1F6FF}\x{1F900}-\x{1F9FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}\x{2190}-\x{21FF}\x{2300}-\x{23FF}]+",
    ),
    strip("script_block", r"(?is)<script\b[^>]*>.*?</script>"),
    drop_line("menu_label", r"(?i)^\s*(overview|features|reviews|faqs?)\s*$"),
    drop_line("faq_heading", r"(?i)^\s*frequently\s+asked\s+questions\s*$"),
    drop_line("as_seen_on", r"(?i)\bas\s*seen\s*on\b"),
    drop_line("viral_on_tiktok", r"(?i)\bviral\s+on\s+tiktok\b"),
    drop_line(
        "promotion",
        r"(?i)\b(offer|deal|exclusive\s*offer|early\s*bird|promotion|promo|sale|today\s*only|limited\s*time)\b",
    ),
    drop_line(
        "percent_off",
        r"(?i)\b(\d{1,3}%\s*off|up\s*to\s*\d{1,3}%\s*off|get\s*(up\s*to\s*)?\d{1,3}%\s*off)\b",
    ),
    drop_line("call_to_action", r"(?i)\b(buy\s*now|order\s*now|add\s*to\s*cart|checkout)\b"),
    drop_line("lone_off", r"(?i)^\s*off\s*$"),
    drop_line("rating", r"(?i)\b\d(\.\d+)?\s*/\s*5\b.*(verified\s*reviews?|reviews?|ratings?)\b"),
    drop_line("review_count", r"(?i)\(\s*\d{1,3}(,\d{3})*\s*verified\s*reviews\s*\)\s*$"),
    drop_line("verified_buyer", r"(?i)\bverified\s*buyer\b"),
    drop_line(
        "logistics",
        r"(?i)\b(ship(s|ped|ping)?(\s+by)?|stock\s*level|low\s*stock|back\s*order|backorder|dispatch|deliver(y|ies)|arrives?|usps|fedex|ups|dhl|tracking|warehouse)\b",
    ),
    drop_line(
        "money_back_guarantee",
        r"(?i)\b(\d{1,3}\s*[-–—]?\s*day\s*money\s*[-–—]?\s*back\s*guarantee|money\s*back\s*guarantee)\b",
    ),
    drop_line("iso_date", r"\b\d{4}-\d{2}-\d{2}\b"),
    drop_line("month_day_date", MONTH_DAY_DATE),
    drop_line("day_month_date", DAY_MONTH_DATE),
    drop_line("separator_only", r"^\s*[-–—•·*]+\s*$"),
    drop_line("punctuation_only", r"^\s*[{}();\[\].,|]+\s*$"),
];

struct CompiledRule {
    name: &'static str,
    regex: Regex,
    action: RuleAction,
}

static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    TEXT_RULES
        .iter()
        .map(|rule| CompiledRule {
            name: rule.name,
            regex: Regex::new(rule.pattern).expect("boilerplate rule should compile"),
            action: rule.action,
        })
        .collect()
});

/// Remove boilerplate phrases from plain text.
///
/// Lines that match no rule are preserved in their original relative order.
/// Trailing whitespace is trimmed per line and blank-line runs collapse to one.
pub fn remove_boilerplate(text: &str) -> String {
    let mut current = text.to_string();

    for rule in COMPILED_RULES.iter() {
        current = apply_rule(rule, &current);
    }

    normalize_whitespace(&current)
}

fn apply_rule(rule: &CompiledRule, text: &str) -> String {
    match rule.action {
        RuleAction::Strip => {
            // A removal can join the halves of a new match; repeat until none remain.
            let mut current = text.to_string();
            while rule.regex.is_match(&current) {
                current = rule.regex.replace_all(&current, "").into_owned();
            }
            current
        }
        RuleAction::DropLine => {
            let mut dropped = 0usize;
            let kept: Vec<&str> = text
                .split('\n')
                .filter(|line| {
                    let hit = rule.regex.is_match(line);
                    if hit {
                        dropped += 1;
                    }
                    !hit
                })
                .collect();
            if dropped > 0 {
                debug!(rule = rule.name, dropped, "boilerplate lines dropped");
            }
            kept.join("\n")
        }
    }
}

/// Returns the names of the rules that would drop `line`.
pub fn matching_rules(line: &str) -> Vec<&'static str> {
    COMPILED_RULES
        .iter()
        .filter(|rule| rule.action == RuleAction::DropLine && rule.regex.is_match(line))
        .map(|rule| rule.name)
        .collect()
}

/// Re-clean already extracted plain text.
///
/// Applies whitespace normalization, boilerplate removal and normalization
/// again, then trims. Idempotent: `reclean(&reclean(x)) == reclean(x)`.
pub fn reclean(text: &str) -> String {
    let normalized = normalize_whitespace(text);
    let cleaned = remove_boilerplate(&normalized);
    normalize_whitespace(&cleaned).trim().to_string()
}
