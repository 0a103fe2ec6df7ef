//! Best-effort recovery of a JSON object embedded in model output.
//!
//! Models wrap JSON in prose or code fences. The scan takes everything from
//! the first `{` to the last `}` and parses that span once; there is no
//! balancing and no retry. Two separate objects in one text therefore form
//! a single invalid span and yield nothing.

use serde_json::{Map, Value};

pub trait PayloadExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Option<Map<String, Value>>;
}

/// Greedy first-`{` to last-`}` extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceSpanExtractor;

impl PayloadExtractor for BraceSpanExtractor {
    fn extract(&self, text: &str) -> Option<Map<String, Value>> {
        extract_json_object(text)
    }
}

pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
