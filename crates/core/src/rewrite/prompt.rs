//! Prompt templates and the section schemas they request.
//!
//! Every template is pinned by a [`PromptVersion`]. The version travels with the
//! generated content, so the layout formatter can interpret stored output by the
//! schema it was asked for instead of by layout name.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Layout;

/// Identifies the template that produced a piece of generated content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PromptVersion {
    /// Generic unstructured rewrite, used by every layout without a structured template.
    V1,
    /// Thirteen numbered sections with fixed headings and sub-labels.
    V2InterstitialStructured,
    /// A version string this build does not know. Formatted with the generic schema.
    Unknown(String),
}

impl PromptVersion {
    /// The version used for new generations of `layout`.
    pub fn latest_for(layout: Layout) -> Self {
        match layout {
            Layout::Interstitial => PromptVersion::V2InterstitialStructured,
            Layout::Advertorial | Layout::Generic => PromptVersion::V1,
        }
    }

    /// Parses a stored version tag. Never fails.
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "v1" => PromptVersion::V1,
            "v2-interstitial-structured" => PromptVersion::V2InterstitialStructured,
            other => PromptVersion::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PromptVersion::V1 => "v1",
            PromptVersion::V2InterstitialStructured => "v2-interstitial-structured",
            PromptVersion::Unknown(tag) => tag,
        }
    }

    /// Section schema the formatter applies to content of this version.
    pub fn schema(&self) -> SectionSchema {
        match self {
            PromptVersion::V2InterstitialStructured => SectionSchema::INTERSTITIAL_V2,
            PromptVersion::V1 | PromptVersion::Unknown(_) => SectionSchema::GENERIC,
        }
    }
}

impl fmt::Display for PromptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formatting rules implied by a prompt version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSchema {
    /// Section number holding the dense "bold name + sentence" feature list.
    pub dense_feature_section: Option<u32>,
    /// Label lines that never pair as a feature description.
    pub label_prefixes: &'static [&'static str],
}

impl SectionSchema {
    pub const GENERIC: SectionSchema = SectionSchema { dense_feature_section: None, label_prefixes: &[] };

    pub const INTERSTITIAL_V2: SectionSchema =
        SectionSchema { dense_feature_section: Some(10), label_prefixes: &["Features Body:"] };
}

/// Chat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

const SYSTEM_TEMPLATE: &str = "You are an expert direct-response copywriter. Rewrite content into a high-converting {LAYOUT} while preserving truthful claims and avoiding spammy language. Keep it clear, concise, and compliant. Output markdown or plain text only (no code blocks or triple backticks).";

const GENERIC_V1_TEMPLATE: &str = "Source content (cleaned):

{SOURCE}

Rewrite into the selected format using:
- Strong headline and subhead.
- Clear benefits and credibility.
- Natural transitions, short paragraphs, scannable structure.
- A clear, non-pushy call to action.
- Avoid: price claims, medical claims, or unverifiable promises.";

const INTERSTITIAL_V2_TEMPLATE: &str = "Source content (cleaned):

{SOURCE}

Rewrite into an interstitial using EXACTLY the following numbered sections and headings. Use markdown headings formatted exactly as shown (## **<number>. <Title>**). Under each heading, provide the requested sub-structure. Do NOT wrap the response in code fences. Wherever the product name appears, write {{productName}} instead.

## Required sections and structure (follow exactly):
## **1. Short Headline**
- One short headline with the main benefit (max 8 words).

## **2. The X-Factor of Our Product**
- A line starting with: **Sub-Title:** <short sub-title>
- A line starting with: **Body:** <single concise paragraph>

## **3. Main Product Benefits & Features (Benefit-Focused)**
- 4-6 bullet points using \"* \" prefix.

## **4. Authority Quote**
- **Testimonial Title:** <short sentence, no quotes>
- **Testimonial Body:** <1 short paragraph, no quotes>
- **<Full Name> | <Generic Title>** on its own line.

## **5. The X-Factor, Long Text Format**
- **Title:** Introducing {{productName}}
- **Sub-title:** <compelling sub-title>
- **Body:** <2-4 short paragraphs>

## **6. Four Biggest Benefits/Features**
- **Features Title:** <title>
- **Features Body:** <1 short paragraph>
- **Feature Blocks:**
  * <benefit 1>
  * <benefit 2>
  * <benefit 3>
  * <benefit 4>

## **7. Meet {{productName}}**
- **Body:** <2-3 short paragraphs reaffirming the X-factor>

## **8. Two Biggest Unique Selling Points**
- A bold sub-heading for USP 1 followed by 1-2 paragraphs.
- A bold sub-heading for USP 2 followed by 1-2 paragraphs.

## **9. One Benefit (4-6 Words)**
- A single short line.

## **10. Features (with Short Sentences)**
- **Features Body:** <short motivating line>
- 6 items using \"* **<Feature Name>**\" each followed on the next line by two spaces then a short descriptive sentence.

## **11. Simple \"1-2-3\" of How It Works**
- **Steps Body:** <short motivating line>
- 3 items using \"* **Step X:** <text>\"
- Optional single italic line reinforcing outcome.

## **12. Testimonials**
- 8 short testimonials using generic names. Each name bolded on its own line, followed by one sentence on the next line.

## **13. FAQ**
- 5-6 Q&A pairs. No shipping questions. Avoid anything that puts the product in a bad light.

Constraints:
- Keep language truthful and compliant. Avoid medical claims and unverifiable promises.
- Keep paragraphs short, scannable. No pricing.";

/// Builds the `system` + `user` message pair for `layout` and reports the version used.
pub fn build_messages(layout: Layout, source_text: &str) -> (Vec<ChatMessage>, PromptVersion) {
    let version = PromptVersion::latest_for(layout);
    let system = SYSTEM_TEMPLATE.replace("{LAYOUT}", layout.role_description());
    let template = match version {
        PromptVersion::V2InterstitialStructured => INTERSTITIAL_V2_TEMPLATE,
        PromptVersion::V1 | PromptVersion::Unknown(_) => GENERIC_V1_TEMPLATE,
    };
    let user = template.replace("{SOURCE}", source_text);

    (vec![ChatMessage::system(system), ChatMessage::user(user)], version)
}
