// Shared prompt fragments.
// Each service that needs model calls defines its own prompts.rs alongside it;
// this file holds the pieces every prompt reuses.

/// Persona line opening every analysis prompt.
pub const DERMATOLOGIST_PERSONA: &str = "You are a professional dermatologist AI assistant.";

/// Closing instruction that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Ensure the response is ONLY the JSON object with no additional text. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
