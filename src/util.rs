use serde_json::Value;

pub fn resource_id(resource: &Value) -> String {
    resource
        .get("id")
        .and_then(|i| i.as_str())
        .unwrap_or("")
        .to_string()
}

pub fn attribute_str<'a>(resource: &'a Value, key: &str) -> Option<&'a str> {
    resource
        .get("attributes")
        .and_then(|a| a.get(key))
        .and_then(|s| s.as_str())
}

pub fn vendor_identifier(resource: &Value) -> String {
    attribute_str(resource, "vendorIdentifier")
        .unwrap_or("<unknown>")
        .to_string()
}

pub fn resource_name(resource: &Value) -> String {
    for key in ["referenceName", "name", "locale"] {
        if let Some(s) = attribute_str(resource, key) {
            return s.to_string();
        }
    }
    resource
        .get("id")
        .and_then(|i| i.as_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Id of the single resource in a `{"data": {...}}` document, if any.
pub fn data_id(document: &Value) -> Option<String> {
    document
        .get("data")
        .and_then(|d| d.get("id"))
        .and_then(|s| s.as_str())
        .map(|s| s.to_string())
}

/// Items of a `{"data": [...]}` document; anything else is treated as empty.
pub fn data_items(document: &Value) -> Vec<Value> {
    document
        .get("data")
        .and_then(|d| d.as_array())
        .cloned()
        .unwrap_or_default()
}

pub fn asset_delivery_state(resource: &Value) -> Option<String> {
    resource
        .get("attributes")
        .and_then(|a| a.get("assetDeliveryState"))
        .and_then(|s| s.get("state"))
        .and_then(|s| s.as_str())
        .map(|s| s.to_string())
}

pub fn is_live(resource: &Value) -> bool {
    resource
        .get("attributes")
        .and_then(|a| a.get("live"))
        .and_then(|b| b.as_bool())
        .unwrap_or(false)
}

/// Relationship object pointing at one resource.
pub fn relationship(kind: &str, id: &str) -> Value {
    serde_json::json!({"data": {"type": kind, "id": id}})
}

/// Cuts `text` to at most `max` characters, on a char boundary.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_name_falls_back_to_id() {
        let named = json!({"id": "1", "attributes": {"referenceName": "Level 1 Complete"}});
        assert_eq!(resource_name(&named), "Level 1 Complete");
        let loc = json!({"id": "2", "attributes": {"locale": "en-US"}});
        assert_eq!(resource_name(&loc), "en-US");
        assert_eq!(resource_name(&json!({"id": "3"})), "3");
    }

    #[test]
    fn missing_fields_have_defaults() {
        let v = json!({"attributes": {}});
        assert_eq!(resource_id(&v), "");
        assert_eq!(vendor_identifier(&v), "<unknown>");
        assert!(!is_live(&v));
        assert_eq!(data_id(&json!({"data": null})), None);
        assert!(data_items(&json!({"data": {"id": "x"}})).is_empty());
    }

    #[test]
    fn live_flag_is_read_from_attributes() {
        assert!(is_live(&json!({"attributes": {"live": true}})));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
