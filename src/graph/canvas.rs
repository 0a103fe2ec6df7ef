// Canvas payloads
// Structured side-channel data rendered next to the chat answer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::config::CanvasSettings;

pub const QUIZ_TYPE: &str = "quiz";
pub const IMAGE_TYPE: &str = "image";

/// A JSON object with at least a `type` discriminator.
///
/// Quiz payloads keep whatever fields the model produced; only `type` is
/// injected. `correct_answer` is not checked against `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasPayload(Map<String, Value>);

impl CanvasPayload {
    pub fn quiz(mut fields: Map<String, Value>) -> Self {
        fields.insert("type".to_string(), Value::String(QUIZ_TYPE.to_string()));
        Self(fields)
    }

    /// Placeholder image keyed on the last word of the query.
    pub fn image(query: &str, settings: &CanvasSettings) -> Self {
        let keyword = visual_keyword(query, &settings.placeholder_keyword);
        let url = format!(
            "{}?text={}",
            settings.image_base_url,
            urlencoding::encode(keyword)
        );

        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::String(IMAGE_TYPE.to_string()));
        fields.insert("url".to_string(), Value::String(url));
        fields.insert("caption".to_string(), Value::String(format!("Visual: {}", query)));
        Self(fields)
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(|v| v.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Last whitespace-delimited token, or `placeholder` when there is none.
pub fn visual_keyword<'a>(query: &'a str, placeholder: &'a str) -> &'a str {
    query.split_whitespace().last().unwrap_or(placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyword_is_last_token() {
        assert_eq!(visual_keyword("draw a plant cell", "Img"), "cell");
        assert_eq!(visual_keyword("  mitochondria \n", "Img"), "mitochondria");
    }

    #[test]
    fn keyword_falls_back_to_placeholder() {
        assert_eq!(visual_keyword("", "Img"), "Img");
        assert_eq!(visual_keyword("   ", "Img"), "Img");
    }

    #[test]
    fn image_payload_uses_keyword_and_echoes_query() {
        let payload = CanvasPayload::image("show the plant cell", &CanvasSettings::default());

        assert_eq!(payload.kind(), Some("image"));
        assert_eq!(
            payload.get("url"),
            Some(&json!("https://placehold.co/600x400/png?text=cell"))
        );
        assert_eq!(payload.get("caption"), Some(&json!("Visual: show the plant cell")));
    }

    #[test]
    fn image_url_encodes_keyword() {
        let payload = CanvasPayload::image("what is mitosis?", &CanvasSettings::default());
        assert_eq!(
            payload.get("url"),
            Some(&json!("https://placehold.co/600x400/png?text=mitosis%3F"))
        );
    }

    #[test]
    fn quiz_payload_injects_type_over_model_value() {
        let fields = json!({ "question": "Q?", "type": "mcq" });
        let payload = CanvasPayload::quiz(fields.as_object().cloned().unwrap());

        assert_eq!(payload.kind(), Some("quiz"));
        assert_eq!(payload.get("question"), Some(&json!("Q?")));
    }

    #[test]
    fn serializes_as_plain_object() {
        let payload = CanvasPayload::image("", &CanvasSettings::default());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["url"], "https://placehold.co/600x400/png?text=Img");
        assert_eq!(value["caption"], "Visual: ");
    }
}
