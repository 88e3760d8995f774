// ── URL search parameters ──
//
// An ordered multimap view of a query string. Each key maps to either a
// single value or, when repeated, every value in order of appearance.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value side of a search parameter: `?a=1` or `?a=1&a=2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// The first value, which is what scalar parameters read.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(v) => Some(v.as_str()),
            Self::Many(vs) => vs.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::One(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Many(vec![first, value]);
            }
            Self::Many(vs) => vs.push(value),
        }
    }

    fn values(&self) -> Vec<&str> {
        match self {
            Self::One(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Raw URL search parameters.
///
/// Equality ignores key order, so two URLs that differ only in parameter
/// order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(IndexMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string. A leading
    /// `?` is accepted.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.append(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Build from `(key, value)` pairs; repeated keys accumulate.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.append(key.into(), value.into());
        }
        params
    }

    /// Serialize back to a query string (no leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            for v in value.values() {
                serializer.append_pair(key, v);
            }
        }
        serializer.finish()
    }

    /// First value for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(ParamValue::first)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Add a value, turning the entry into a list if the key repeats.
    pub fn append(&mut self, key: String, value: String) {
        match self.0.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                self.0.insert(key, ParamValue::One(value));
            }
        }
    }

    /// Replace any existing values for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), ParamValue::One(value.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_collects_repeated_keys() {
        let params = QueryParams::parse("?tag=noir&tag=western&page=2");
        assert_eq!(
            params.get("tag"),
            Some(&ParamValue::Many(vec!["noir".into(), "western".into()]))
        );
        assert_eq!(params.first("tag"), Some("noir"));
        assert_eq!(params.first("page"), Some("2"));
    }

    #[test]
    fn parse_decodes_percent_and_plus() {
        let params = QueryParams::parse("title=the+third%20man");
        assert_eq!(params.first("title"), Some("the third man"));
    }

    #[test]
    fn query_string_round_trips() {
        let raw = "page=2&tag=a&tag=b&q=caf%C3%A9";
        let params = QueryParams::parse(raw);
        assert_eq!(QueryParams::parse(&params.to_query_string()), params);
    }

    #[test]
    fn equality_ignores_order() {
        let a = QueryParams::parse("page=2&page_size=10");
        let b = QueryParams::parse("page_size=10&page=2");
        assert_eq!(a, b);
    }

    #[test]
    fn set_replaces_and_remove_drops() {
        let mut params = QueryParams::parse("page=2&page=3");
        params.set("page", "4");
        assert_eq!(params.get("page"), Some(&ParamValue::One("4".into())));
        params.remove("page");
        assert!(params.is_empty());
    }
}
