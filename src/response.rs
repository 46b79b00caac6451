/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::errors::FlickrError;
use crate::xml::{self, XmlElement};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum_macros::{EnumString, IntoStaticStr};

/// The JSON responses of the service arrive wrapped in this fixed
/// callback-style envelope unless the no-callback flag was requested.
const JSON_ENVELOPE_PREFIX: &str = "jsonFlickrApi(";

/// Wire formats the service can respond in.
///
/// Selected per request; the decoder dispatches on the variant, so an
/// unsupported format is unrepresentable rather than a runtime string check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ResponseFormat {
    /// XML document rooted at `<rsp>`, decoded into an element tree.
    Rest,
    /// JSON in the `jsonFlickrApi(...)` envelope, kept as the raw inner text.
    Json,
    /// Unwrapped JSON deserialized into a [`serde_json::Value`].
    Serialized,
}

impl ResponseFormat {
    /// Request parameters that select this format on the wire.
    pub fn request_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ResponseFormat::Rest => &[("format", "rest")],
            ResponseFormat::Json => &[("format", "json")],
            ResponseFormat::Serialized => &[("format", "json"), ("nojsoncallback", "1")],
        }
    }
}

/// Remote call status as reported by the `stat` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Ok,
    Fail,
}

impl Stat {
    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "ok" => Some(Stat::Ok),
            "fail" => Some(Stat::Fail),
            _ => None,
        }
    }
}

/// Decoded payload, one representation per wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Element tree of a rest response.
    Tree(XmlElement),
    /// Raw inner JSON text of an enveloped json response.
    Raw(String),
    /// Deserialized value of a native-serialized response.
    Value(Value),
}

/// The normalized result of one API call, independent of wire format.
///
/// Error code and message are populated exactly when the status is
/// [`Stat::Fail`]; a successful response always carries neither.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    stat: Stat,
    error_code: Option<u32>,
    error_message: Option<String>,
    format: ResponseFormat,
    data: ResponseData,
}

impl ApiResponse {
    /// Decodes a raw payload in the given wire format.
    ///
    /// Malformed rest and json payloads are [`FlickrError::Parse`]; a
    /// malformed native-serialized payload is [`FlickrError::Deserialize`].
    /// Both carry the offending raw text unmodified. A payload that reports
    /// `stat="fail"` still decodes successfully; callers opt into raising it
    /// with [`into_result`](Self::into_result).
    pub fn decode(format: ResponseFormat, raw: &str) -> Result<Self, FlickrError> {
        match format {
            ResponseFormat::Rest => Self::decode_rest(raw),
            ResponseFormat::Json => Self::decode_json(raw),
            ResponseFormat::Serialized => Self::decode_serialized(raw),
        }
    }

    fn decode_rest(raw: &str) -> Result<Self, FlickrError> {
        let root = xml::parse_document(raw)?;
        let stat_attr = root.attr("stat").ok_or_else(|| FlickrError::Parse {
            raw: raw.to_string(),
            detail: "response has no stat attribute".into(),
        })?;
        let stat = Stat::from_wire(stat_attr).ok_or_else(|| FlickrError::Parse {
            raw: raw.to_string(),
            detail: format!("unrecognized stat value {stat_attr:?}"),
        })?;

        let (error_code, error_message) = match stat {
            Stat::Ok => (None, None),
            Stat::Fail => {
                let err = root.child("err");
                let code = err
                    .and_then(|e| e.attr("code"))
                    .and_then(|c| c.parse::<u32>().ok())
                    .unwrap_or(0);
                let message = err
                    .and_then(|e| e.attr("msg"))
                    .unwrap_or_default()
                    .to_string();
                (Some(code), Some(message))
            }
        };

        Ok(Self {
            stat,
            error_code,
            error_message,
            format: ResponseFormat::Rest,
            data: ResponseData::Tree(root),
        })
    }

    fn decode_json(raw: &str) -> Result<Self, FlickrError> {
        let inner = raw
            .trim()
            .strip_prefix(JSON_ENVELOPE_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| FlickrError::Parse {
                raw: raw.to_string(),
                detail: format!("payload does not match the {JSON_ENVELOPE_PREFIX}...) envelope"),
            })?;

        let value: Value = serde_json::from_str(inner).map_err(|e| FlickrError::Parse {
            raw: raw.to_string(),
            detail: format!("envelope content is not valid JSON: {e}"),
        })?;
        let (stat, error_code, error_message) = stat_fields(&value, raw)?;

        Ok(Self {
            stat,
            error_code,
            error_message,
            format: ResponseFormat::Json,
            data: ResponseData::Raw(inner.to_string()),
        })
    }

    fn decode_serialized(raw: &str) -> Result<Self, FlickrError> {
        let value: Value = serde_json::from_str(raw).map_err(|source| FlickrError::Deserialize {
            raw: raw.to_string(),
            source,
        })?;
        let (stat, error_code, error_message) = stat_fields(&value, raw)?;

        Ok(Self {
            stat,
            error_code,
            error_message,
            format: ResponseFormat::Serialized,
            data: ResponseData::Value(value),
        })
    }

    pub fn is_ok(&self) -> bool {
        self.stat == Stat::Ok
    }

    pub fn stat(&self) -> Stat {
        self.stat
    }

    /// Remote error code; `Some` exactly when the call failed.
    pub fn error_code(&self) -> Option<u32> {
        self.error_code
    }

    /// Remote error message; `Some` exactly when the call failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn data(&self) -> &ResponseData {
        &self.data
    }

    pub fn into_data(self) -> ResponseData {
        self.data
    }

    /// Turns a failed response into [`FlickrError::MethodFailure`], passing a
    /// successful one through.
    pub fn into_result(self) -> Result<Self, FlickrError> {
        match self.stat {
            Stat::Ok => Ok(self),
            Stat::Fail => Err(FlickrError::MethodFailure {
                code: self.error_code.unwrap_or(0),
                message: self.error_message.unwrap_or_default(),
            }),
        }
    }

    /// Looks up a text value by element/field path.
    ///
    /// For a tree payload each segment descends into the first child of that
    /// name, the final segment falling back to an attribute; for the JSON
    /// payloads each segment is an object field, with the service's
    /// `{"_content": ...}` wrapping unwrapped at the leaf. Missing or empty
    /// values are `None`.
    pub fn field_text(&self, path: &[&str]) -> Option<String> {
        match &self.data {
            ResponseData::Tree(root) => tree_text(root, path),
            ResponseData::Value(value) => value_text(value, path),
            ResponseData::Raw(inner) => {
                let value: Value = serde_json::from_str(inner).ok()?;
                value_text(&value, path)
            }
        }
    }

    /// Deserializes the named top-level payload field into a typed value.
    ///
    /// Only the JSON-based formats carry enough structure for this; a rest
    /// payload reports [`FlickrError::Config`].
    pub fn parse_payload<T: DeserializeOwned>(&self, field: &str) -> Result<T, FlickrError> {
        let value = match &self.data {
            ResponseData::Value(value) => value.get(field).cloned(),
            ResponseData::Raw(inner) => {
                let value: Value =
                    serde_json::from_str(inner).map_err(|source| FlickrError::Deserialize {
                        raw: inner.clone(),
                        source,
                    })?;
                value.get(field).cloned()
            }
            ResponseData::Tree(_) => {
                return Err(FlickrError::Config(
                    "typed payload extraction requires a JSON-based response format".into(),
                ));
            }
        };

        let value = value.ok_or_else(|| FlickrError::Parse {
            raw: self.to_string(),
            detail: format!("payload has no {field:?} field"),
        })?;
        serde_json::from_value(value.clone()).map_err(|source| FlickrError::Deserialize {
            raw: value.to_string(),
            source,
        })
    }
}

/// Renders the payload the way its wire format would: serialized XML text,
/// the raw JSON text, or the re-serialized native value.
impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ResponseData::Tree(root) => write!(f, "{root}"),
            ResponseData::Raw(inner) => f.write_str(inner),
            ResponseData::Value(value) => f.write_str(&value.to_string()),
        }
    }
}

fn stat_fields(value: &Value, raw: &str) -> Result<(Stat, Option<u32>, Option<String>), FlickrError> {
    let stat_str = value
        .get("stat")
        .and_then(Value::as_str)
        .ok_or_else(|| FlickrError::Parse {
            raw: raw.to_string(),
            detail: "response has no stat field".into(),
        })?;
    let stat = Stat::from_wire(stat_str).ok_or_else(|| FlickrError::Parse {
        raw: raw.to_string(),
        detail: format!("unrecognized stat value {stat_str:?}"),
    })?;

    match stat {
        Stat::Ok => Ok((stat, None, None)),
        Stat::Fail => {
            let code = value
                .get("code")
                .and_then(|c| c.as_u64().or_else(|| c.as_str().and_then(|s| s.parse().ok())))
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(0);
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok((stat, Some(code), Some(message)))
        }
    }
}

fn tree_text(root: &XmlElement, path: &[&str]) -> Option<String> {
    let mut current = root;
    for (idx, segment) in path.iter().enumerate() {
        match current.child(segment) {
            Some(child) => current = child,
            None if idx == path.len() - 1 => {
                return current.attr(segment).map(str::to_string);
            }
            None => return None,
        }
    }
    if current.text.is_empty() {
        None
    } else {
        Some(current.text.clone())
    }
}

fn value_text(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    leaf_text(current)
}

fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("_content").and_then(leaf_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const REST_OK: &str = r#"<rsp stat="ok"><frob>746563-20-759abc</frob></rsp>"#;
    const REST_FAIL: &str = r#"<rsp stat="fail"><err code="97" msg="Missing signature" /></rsp>"#;
    const JSON_OK: &str = r#"jsonFlickrApi({"frob":{"_content":"746563-20-759abc"},"stat":"ok"})"#;
    const JSON_FAIL: &str =
        r#"jsonFlickrApi({"stat":"fail","code":100,"message":"Invalid API Key"})"#;
    const SERIAL_OK: &str = r#"{"frob":{"_content":"746563-20-759abc"},"stat":"ok"}"#;
    const SERIAL_FAIL: &str = r#"{"stat":"fail","code":108,"message":"Invalid frob"}"#;

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!(ResponseFormat::from_str("rest").unwrap(), ResponseFormat::Rest);
        assert_eq!(ResponseFormat::from_str("JSON").unwrap(), ResponseFormat::Json);
        assert_eq!(
            ResponseFormat::from_str("serialized").unwrap(),
            ResponseFormat::Serialized
        );
        assert!(ResponseFormat::from_str("soap").is_err());
    }

    #[test]
    fn ok_responses_carry_no_error_fields() {
        for (format, raw) in [
            (ResponseFormat::Rest, REST_OK),
            (ResponseFormat::Json, JSON_OK),
            (ResponseFormat::Serialized, SERIAL_OK),
        ] {
            let resp = ApiResponse::decode(format, raw).unwrap();
            assert!(resp.is_ok(), "{format:?}");
            assert_eq!(resp.error_code(), None, "{format:?}");
            assert_eq!(resp.error_message(), None, "{format:?}");
        }
    }

    #[test]
    fn failed_responses_always_carry_both_error_fields() {
        for (format, raw, code, message) in [
            (ResponseFormat::Rest, REST_FAIL, 97, "Missing signature"),
            (ResponseFormat::Json, JSON_FAIL, 100, "Invalid API Key"),
            (ResponseFormat::Serialized, SERIAL_FAIL, 108, "Invalid frob"),
        ] {
            let resp = ApiResponse::decode(format, raw).unwrap();
            assert!(!resp.is_ok(), "{format:?}");
            assert_eq!(resp.error_code(), Some(code), "{format:?}");
            assert_eq!(resp.error_message(), Some(message), "{format:?}");
        }
    }

    #[test]
    fn failure_with_missing_error_fields_still_satisfies_the_invariant() {
        let resp =
            ApiResponse::decode(ResponseFormat::Serialized, r#"{"stat":"fail"}"#).unwrap();
        assert_eq!(resp.error_code(), Some(0));
        assert_eq!(resp.error_message(), Some(""));

        let resp =
            ApiResponse::decode(ResponseFormat::Rest, r#"<rsp stat="fail" />"#).unwrap();
        assert_eq!(resp.error_code(), Some(0));
        assert_eq!(resp.error_message(), Some(""));
    }

    #[test]
    fn string_error_codes_are_accepted() {
        let resp = ApiResponse::decode(
            ResponseFormat::Serialized,
            r#"{"stat":"fail","code":"96","message":"Invalid signature"}"#,
        )
        .unwrap();
        assert_eq!(resp.error_code(), Some(96));
    }

    #[test]
    fn out_of_range_error_codes_fall_back_to_the_default() {
        // 2^32 + 1 would truncate to a plausible-looking 1.
        for raw in [
            r#"{"stat":"fail","code":4294967297,"message":"Unknown"}"#,
            r#"{"stat":"fail","code":"4294967297","message":"Unknown"}"#,
        ] {
            let resp = ApiResponse::decode(ResponseFormat::Serialized, raw).unwrap();
            assert_eq!(resp.error_code(), Some(0), "{raw}");
        }

        let resp = ApiResponse::decode(
            ResponseFormat::Rest,
            r#"<rsp stat="fail"><err code="4294967297" msg="Unknown" /></rsp>"#,
        )
        .unwrap();
        assert_eq!(resp.error_code(), Some(0));
    }

    #[test]
    fn into_result_raises_method_failure() {
        let resp = ApiResponse::decode(ResponseFormat::Json, JSON_FAIL).unwrap();
        match resp.into_result() {
            Err(FlickrError::MethodFailure { code, message }) => {
                assert_eq!(code, 100);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("expected MethodFailure, got {other:?}"),
        }

        let resp = ApiResponse::decode(ResponseFormat::Json, JSON_OK).unwrap();
        assert!(resp.into_result().is_ok());
    }

    #[test]
    fn json_without_the_envelope_is_a_parse_error_with_raw_text() {
        let raw = r#"{"stat":"ok"}"#;
        match ApiResponse::decode(ResponseFormat::Json, raw) {
            Err(FlickrError::Parse { raw: carried, .. }) => assert_eq!(carried, raw),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn json_with_invalid_envelope_content_keeps_the_full_original() {
        let raw = "jsonFlickrApi({not json)";
        match ApiResponse::decode(ResponseFormat::Json, raw) {
            Err(FlickrError::Parse { raw: carried, .. }) => assert_eq!(carried, raw),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_payloads_error_per_format() {
        assert!(matches!(
            ApiResponse::decode(ResponseFormat::Rest, ""),
            Err(FlickrError::Parse { .. })
        ));
        assert!(matches!(
            ApiResponse::decode(ResponseFormat::Json, ""),
            Err(FlickrError::Parse { .. })
        ));
        match ApiResponse::decode(ResponseFormat::Serialized, "") {
            Err(FlickrError::Deserialize { raw, .. }) => assert_eq!(raw, ""),
            other => panic!("expected deserialize error, got {other:?}"),
        }
    }

    #[test]
    fn missing_stat_is_a_parse_error() {
        assert!(matches!(
            ApiResponse::decode(ResponseFormat::Serialized, r#"{"frob":"x"}"#),
            Err(FlickrError::Parse { .. })
        ));
        assert!(matches!(
            ApiResponse::decode(ResponseFormat::Rest, "<rsp><frob>x</frob></rsp>"),
            Err(FlickrError::Parse { .. })
        ));
        assert!(matches!(
            ApiResponse::decode(ResponseFormat::Rest, r#"<rsp stat="maybe" />"#),
            Err(FlickrError::Parse { .. })
        ));
    }

    #[test]
    fn field_text_reads_all_three_payload_shapes() {
        for (format, raw) in [
            (ResponseFormat::Rest, REST_OK),
            (ResponseFormat::Json, JSON_OK),
            (ResponseFormat::Serialized, SERIAL_OK),
        ] {
            let resp = ApiResponse::decode(format, raw).unwrap();
            assert_eq!(
                resp.field_text(&["frob"]).as_deref(),
                Some("746563-20-759abc"),
                "{format:?}"
            );
            assert_eq!(resp.field_text(&["missing"]), None);
        }
    }

    #[test]
    fn field_text_descends_paths_and_attributes() {
        let rest = r#"<rsp stat="ok"><auth><token>abc</token><user nsid="99@N00" username="sam" /></auth></rsp>"#;
        let resp = ApiResponse::decode(ResponseFormat::Rest, rest).unwrap();
        assert_eq!(resp.field_text(&["auth", "token"]).as_deref(), Some("abc"));
        assert_eq!(
            resp.field_text(&["auth", "user", "nsid"]).as_deref(),
            Some("99@N00")
        );

        let serial = r#"{"auth":{"token":{"_content":"abc"},"user":{"nsid":"99@N00","username":"sam"}},"stat":"ok"}"#;
        let resp = ApiResponse::decode(ResponseFormat::Serialized, serial).unwrap();
        assert_eq!(resp.field_text(&["auth", "token"]).as_deref(), Some("abc"));
        assert_eq!(
            resp.field_text(&["auth", "user", "nsid"]).as_deref(),
            Some("99@N00")
        );
    }

    #[test]
    fn display_matches_the_wire_format() {
        let resp = ApiResponse::decode(ResponseFormat::Json, JSON_OK).unwrap();
        assert_eq!(
            resp.to_string(),
            r#"{"frob":{"_content":"746563-20-759abc"},"stat":"ok"}"#
        );

        let resp = ApiResponse::decode(ResponseFormat::Rest, REST_FAIL).unwrap();
        assert_eq!(resp.to_string(), REST_FAIL);
    }

    #[test]
    fn parse_payload_deserializes_json_formats_only() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Frob {
            #[serde(rename = "_content")]
            content: String,
        }

        let resp = ApiResponse::decode(ResponseFormat::Serialized, SERIAL_OK).unwrap();
        let frob: Frob = resp.parse_payload("frob").unwrap();
        assert_eq!(frob.content, "746563-20-759abc");

        let resp = ApiResponse::decode(ResponseFormat::Json, JSON_OK).unwrap();
        let frob: Frob = resp.parse_payload("frob").unwrap();
        assert_eq!(frob.content, "746563-20-759abc");

        let resp = ApiResponse::decode(ResponseFormat::Rest, REST_OK).unwrap();
        assert!(matches!(
            resp.parse_payload::<Frob>("frob"),
            Err(FlickrError::Config(_))
        ));
    }
}
