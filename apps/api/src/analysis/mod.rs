// Skin analysis pipeline.
// Implements: prompt construction, single model call, JSON extraction with
// fallback, and the submission lifecycle with cosmetic progress.
// All model calls go through llm_client; no direct API calls here.

pub mod adapter;
pub mod extract;
pub mod fallback;
pub mod handlers;
pub mod handoff;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod view;
