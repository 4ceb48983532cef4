use serde_json::Value as JsonValue;

/// A store row the engine can read sort keys from. Rows are otherwise opaque.
pub trait Record {
    fn field_value(&self, path: &str) -> Option<JsonValue>;
}

impl Record for JsonValue {
    fn field_value(&self, path: &str) -> Option<JsonValue> {
        lookup_path(self, path).cloned()
    }
}

/// Resolve a dotted path (`"location.city"`) inside a JSON document.
pub fn lookup_path<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(doc, |cur, seg| match cur {
        JsonValue::Object(map) => map.get(seg),
        JsonValue::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
