use url::form_urlencoded;

/// Raw value of one query-string key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// First value; multi-valued keys behave like their first entry in scalar contexts.
    pub fn first(&self) -> &str {
        match self {
            ParamValue::Single(s) => s,
            ParamValue::Multi(v) => v.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(s) => vec![s.as_str()],
            ParamValue::Multi(v) => v.iter().map(String::as_str).collect(),
        }
    }

    fn append(&mut self, value: String) {
        match self {
            ParamValue::Single(s) => {
                let first = std::mem::take(s);
                *self = ParamValue::Multi(vec![first, value]);
            }
            ParamValue::Multi(v) => v.push(value),
        }
    }
}

/// Flat mapping of query-string keys to values, in first-seen key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (leading `?` allowed).
    /// Repeated keys become multi-valued.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Append a value, turning an existing key multi-valued.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.append(value),
            None => self.entries.push((key, ParamValue::Single(value))),
        }
    }

    /// Set a key, replacing any previous value in place.
    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar view of a key (first value when multi-valued).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).map(ParamValue::first)
    }

    /// Scalar view that treats an empty value like an absent key.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-encode as a query string; multi-valued keys repeat.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.entries {
            for value in v.values() {
                ser.append_pair(k, value);
            }
        }
        ser.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}
