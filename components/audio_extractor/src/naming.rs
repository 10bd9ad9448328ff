// components/audio_extractor/src/naming.rs
use chrono::Utc;

/// Stem used when a title sanitizes down to nothing.
pub const FALLBACK_STEM: &str = "audio";

/// Strip everything outside word characters, whitespace and hyphens from a
/// title, falling back to [`FALLBACK_STEM`] when nothing survives.
///
/// Idempotent: sanitizing an already-sanitized title is a no-op.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Millisecond-timestamp stem. Two requests landing in the same millisecond
/// derive the same stem; the orchestrator's name reservation keeps their
/// output paths apart.
pub fn timestamp_stem() -> String {
    format!("{}_{}", FALLBACK_STEM, Utc::now().timestamp_millis())
}
