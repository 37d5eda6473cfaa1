// Prompt template for skin analysis.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::analysis::models::Profile;
use crate::llm_client::prompts::{DERMATOLOGIST_PERSONA, JSON_ONLY_INSTRUCTION};

/// Product recommendation policy embedded in every routine step of the schema.
pub const PRODUCT_POLICY: &str = "Product recommendation (use commonly used and \
    dermatologist-approved products, preferably affordable and widely available, such as \
    Cetaphil, CeraVe, Minimalist, The Ordinary, Dermaco, Neutrogena, etc.) It's not \
    compulsory to include only these companies; companies like these which are affordable \
    and used by most people are also fine";

/// Analysis prompt template.
/// Replace: {persona}, {name}, {age}, {gender}, {skin_type}, {skin_concerns},
///          {goals}, {product_policy}, {json_only_instruction}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"{persona} Based on the following information, provide a detailed skincare analysis and personalized routine.

User Information:
- Name: {name}
- Age: {age}
- Gender: {gender}
- Skin Type: {skin_type}
- Skin Concerns: {skin_concerns}
- Skincare Goals: {goals}

Please provide a response in the following JSON format:
{
  "skinType": "Analyzed skin type",
  "concerns": ["Concern 1", "Concern 2"],
  "morningRoutine": {
    "steps": [
      {
        "step": "Step name (e.g., Cleanse)",
        "product": "{product_policy}",
        "description": "Brief description of why this product is recommended"
      }
    ]
  },
  "eveningRoutine": {
    "steps": [
      {
        "step": "Step name (e.g., Cleanse)",
        "product": "{product_policy}",
        "description": "Brief description of why this product is recommended"
      }
    ]
  },
  "hydrationScore": Number between 0-100,
  "oilinessScore": Number between 0-100,
  "tips": ["Tip 1", "Tip 2", "Tip 3", "Tip 4", "Tip 5"]
}

{json_only_instruction}"#;

/// Separator between concern ids in the prompt.
pub const CONCERN_DELIMITER: &str = ", ";

/// Renders the analysis prompt for a profile. Field values are embedded
/// verbatim; the image, if any, does not affect the text.
pub fn build_analysis_prompt(profile: &Profile) -> String {
    let concerns = profile.concern_ids().join(CONCERN_DELIMITER);
    let gender = profile.gender.map(|g| g.id()).unwrap_or_default();
    let skin_type = profile.skin_type.map(|t| t.id()).unwrap_or_default();

    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("persona", DERMATOLOGIST_PERSONA),
            ("name", profile.name.as_str()),
            ("age", profile.age.as_str()),
            ("gender", gender),
            ("skin_type", skin_type),
            ("skin_concerns", concerns.as_str()),
            ("goals", profile.goals.as_str()),
            ("product_policy", PRODUCT_POLICY),
            ("json_only_instruction", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Single-pass `{key}` substitution. Substituted values are never rescanned,
/// so user text containing `{name}` stays literal. Braces that do not form a
/// known placeholder are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let placeholder = values.iter().find(|(key, _)| {
            tail[1..]
                .strip_prefix(key)
                .is_some_and(|after| after.starts_with('}'))
        });
        match placeholder {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
