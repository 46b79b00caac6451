/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use std::collections::BTreeMap;

/// Caller-supplied request parameters, as the specific API method expects them
pub type ApiParams<'a> = [(&'a str, &'a str)];

/// A set of request parameters with unique names.
///
/// Backed by a `BTreeMap`, so iteration is always in byte-wise name order and
/// the original insertion order is irrelevant. Everything derived from the
/// canonical form, signatures and cache keys included, stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the previous value if the name was
    /// already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Inserts every pair from a caller-supplied slice.
    pub fn extend_pairs(&mut self, params: &ApiParams<'_>) {
        for (name, value) in params {
            self.insert(*name, *value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates pairs in byte-wise name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Produces the canonical `name=value&...` form of the set.
    ///
    /// The same string is used as the GET query string, as the POST body, and
    /// as the input to request signing, so the encoding must match what the
    /// service decodes exactly. Names and values are percent-encoded with the
    /// RFC 3986 unreserved table: `A-Z a-z 0-9 - . _ ~` pass through, every
    /// other byte becomes `%XX`. Pairs are joined with `&` in byte-wise name
    /// order. An empty set canonicalizes to the empty string.
    pub fn canonical_query(&self) -> String {
        self.iter()
            .map(|(name, value)| {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut set = ParameterSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl FromIterator<(String, String)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        ParameterSet(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_ignores_insertion_order() {
        let forward: ParameterSet = [("a", "1"), ("b", "2")].into_iter().collect();
        let reversed: ParameterSet = [("b", "2"), ("a", "1")].into_iter().collect();

        assert_eq!(forward.canonical_query(), "a=1&b=2");
        assert_eq!(forward.canonical_query(), reversed.canonical_query());
    }

    #[test]
    fn empty_set_canonicalizes_to_empty_string() {
        assert_eq!(ParameterSet::new().canonical_query(), "");
    }

    #[test]
    fn sorting_is_byte_wise_not_lexical() {
        // 'Z' (0x5a) sorts before 'a' (0x61)
        let params: ParameterSet = [("a", "1"), ("Z", "2")].into_iter().collect();
        assert_eq!(params.canonical_query(), "Z=2&a=1");
    }

    #[test]
    fn values_use_the_rfc3986_unreserved_table() {
        let params: ParameterSet = [
            ("text", "a b"),
            ("path", "x/y"),
            ("keep", "A-Za-z0-9-._~"),
            ("plus", "1+1"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            params.canonical_query(),
            "keep=A-Za-z0-9-._~&path=x%2Fy&plus=1%2B1&text=a%20b"
        );
    }

    #[test]
    fn non_ascii_values_are_encoded_per_byte() {
        let params: ParameterSet = [("tags", "caf\u{e9}")].into_iter().collect();
        assert_eq!(params.canonical_query(), "tags=caf%C3%A9");
    }

    #[test]
    fn duplicate_insert_replaces() {
        let mut params = ParameterSet::new();
        assert_eq!(params.insert("page", "1"), None);
        assert_eq!(params.insert("page", "2"), Some("1".to_string()));
        assert_eq!(params.canonical_query(), "page=2");
    }
}
