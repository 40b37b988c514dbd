//! Identifier resolution for linked-data objects

use serde_json::Value;

/// Get the identifier of a JSON-LD object.
///
/// A compacted document may use either `@id` or `id`; `@id` wins when both
/// are present.
pub fn get_id(obj: &Value) -> Option<&str> {
    obj.get("@id").or_else(|| obj.get("id")).and_then(Value::as_str)
}

/// Resolve a link member (`outbox`, `first`, ...) to an IRI.
///
/// Links are either a bare IRI string or an embedded object carrying its own
/// identifier.
pub fn link_iri(link: &Value) -> Option<&str> {
    match link {
        Value::String(iri) => Some(iri),
        Value::Object(_) => get_id(link),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_at_id_preferred() {
        let obj = json!({"@id": "X", "id": "Y"});
        assert_eq!(get_id(&obj), Some("X"));
    }

    #[test]
    fn test_plain_id() {
        let obj = json!({"id": "Y"});
        assert_eq!(get_id(&obj), Some("Y"));
    }

    #[test]
    fn test_missing_id() {
        assert_eq!(get_id(&json!({})), None);
        assert_eq!(get_id(&json!("https://example.com/a")), None);
    }

    #[test]
    fn test_link_iri() {
        assert_eq!(
            link_iri(&json!("https://example.com/outbox")),
            Some("https://example.com/outbox")
        );
        assert_eq!(
            link_iri(&json!({"id": "https://example.com/outbox?page=1", "type": "OrderedCollectionPage"})),
            Some("https://example.com/outbox?page=1")
        );
        assert_eq!(link_iri(&json!(42)), None);
        assert_eq!(link_iri(&json!({"type": "Link"})), None);
    }
}
