//! Pull a JSON object out of free-form model output.
//!
//! Tiers, in order:
//!   1. the whole text parses as JSON
//!   2. a fenced code block (```json ... ```) holds the object
//!   3. the first balanced `{...}` substring, then first `{` to last `}`

use crate::error::{GameError, GameResult};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn fenced_block() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

pub fn extract_json<T: DeserializeOwned>(text: &str) -> GameResult<T> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }

    if let Some(caps) = fenced_block().and_then(|re| re.captures(trimmed)) {
        if let Some(body) = caps.get(1) {
            if let Ok(v) = serde_json::from_str(body.as_str()) {
                return Ok(v);
            }
        }
    }

    if let Some(candidate) = first_balanced_object(trimmed) {
        if let Ok(v) = serde_json::from_str(candidate) {
            return Ok(v);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str(&trimmed[start..=end]) {
                return Ok(v);
            }
        }
    }

    Err(GameError::JsonExtraction)
}

/// The first complete `{...}` substring, balancing braces outside
/// string literals.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    return Some(&text[start..=end]);
                }
            }
            _ => {}
        }
    }
    None
}
