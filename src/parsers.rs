/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! Deserialization helpers for the loosely typed values the service emits.

use serde::{Deserialize, Deserializer};

/// Reads a flag the service may send as a bool, a 0/1 integer, or a string.
pub(crate) fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(value) => Ok(value),
        Raw::Int(value) => Ok(value != 0),
        Raw::Str(value) => match value.as_str() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "not a boolean flag: {other:?}"
            ))),
        },
    }
}

/// Reads a count the service may send as an integer or a numeric string.
pub(crate) fn u64_from_string_or_int<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Str(value) => value
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not an integer: {value:?}"))),
    }
}

/// Reads a string the service may wrap as `{"_content": "..."}`.
pub(crate) fn content_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Plain(String),
        Wrapped {
            #[serde(rename = "_content")]
            content: String,
        },
    }

    match Raw::deserialize(deserializer)? {
        Raw::Plain(value) => Ok(value),
        Raw::Wrapped { content } => Ok(content),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(deserialize_with = "super::bool_from_int")]
        public: bool,
        #[serde(deserialize_with = "super::u64_from_string_or_int")]
        total: u64,
        #[serde(deserialize_with = "super::content_string")]
        title: String,
    }

    #[test]
    fn accepts_every_wire_shape() {
        let flags: Flags = serde_json::from_str(
            r#"{"public":1,"total":"42","title":{"_content":"Sunset"}}"#,
        )
        .unwrap();
        assert!(flags.public);
        assert_eq!(flags.total, 42);
        assert_eq!(flags.title, "Sunset");

        let flags: Flags =
            serde_json::from_str(r#"{"public":"0","total":7,"title":"Plain"}"#).unwrap();
        assert!(!flags.public);
        assert_eq!(flags.total, 7);
        assert_eq!(flags.title, "Plain");

        let flags: Flags =
            serde_json::from_str(r#"{"public":true,"total":0,"title":""}"#).unwrap();
        assert!(flags.public);
    }

    #[test]
    fn rejects_nonsense_values() {
        assert!(
            serde_json::from_str::<Flags>(r#"{"public":"yes?","total":1,"title":"t"}"#).is_err()
        );
        assert!(
            serde_json::from_str::<Flags>(r#"{"public":1,"total":"many","title":"t"}"#).is_err()
        );
    }
}
