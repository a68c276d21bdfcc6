use qualstat_protocol::EntityRef;
use serde_json::Value;

/// Keys that may carry the identifier of an embedded snapshot object, in lookup order.
const EMBEDDED_ID_KEYS: [&str; 3] = ["_id", "id", "$oid"];

/// Embedded snapshots rarely nest more than `{_id: {$oid: ..}}`.
const MAX_NESTING: usize = 4;

/// Canonical string identifier of a code or document reference.
///
/// Accepts a bare string or numeric id, or an object whose `_id` / `id` / `$oid`
/// field holds one (recursively). Absent, null, empty or otherwise unusable
/// references yield `None`.
pub fn normalize_id(reference: &EntityRef) -> Option<String> {
    normalize_value(&reference.0, 0)
}

/// [`normalize_id`] for optional references.
pub fn normalize_opt(reference: Option<&EntityRef>) -> Option<String> {
    reference.and_then(normalize_id)
}

fn normalize_value(value: &Value, depth: usize) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Object(map) if depth < MAX_NESTING => EMBEDDED_ID_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|inner| normalize_value(inner, depth + 1)),
        _ => None,
    }
}
