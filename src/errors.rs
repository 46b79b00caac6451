/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use num_enum::TryFromPrimitive;
use std::io;
use thiserror::Error;

/// Error conditions that can be returned
#[derive(Error, Debug)]
pub enum FlickrError {
    #[error("I/O error")]
    Io(#[from] io::Error),

    /// Transport failure. Never retried by this layer; retry policy is a
    /// caller concern.
    #[error("request network error")]
    Connection(#[from] reqwest::Error),

    #[error("URL parse error")]
    UrlParsing(#[from] url::ParseError),

    /// The payload bytes were not a well-formed document for the selected
    /// format. `raw` is the offending payload, unmodified, for diagnostics.
    #[error("malformed payload: {detail}")]
    Parse { raw: String, detail: String },

    /// The native-serialized payload could not be deserialized.
    #[error("deserialization error: {source}")]
    Deserialize {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed response reporting a remote-side failure, raised only
    /// when the caller opts into raise-on-failure semantics.
    #[error("API method failed: {code}: {message}")]
    MethodFailure { code: u32, message: String },

    /// The persisted cache file is not a valid store. The loader's caller
    /// decides whether to fall back to an empty cache.
    #[error("cache store corrupt: {detail}")]
    StoreCorrupt { detail: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl FlickrError {
    /// Classifies a [`FlickrError::MethodFailure`] against the documented
    /// service error codes, when recognized.
    pub fn api_code(&self) -> Option<FlickrErrorCode> {
        match self {
            FlickrError::MethodFailure { code, .. } => FlickrErrorCode::try_from(*code).ok(),
            _ => None,
        }
    }
}

/// Error codes per the Flickr API docs
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum FlickrErrorCode {
    InvalidSignature = 96,
    MissingSignature = 97,
    LoginFailed = 98,
    InsufficientPermissions = 99,
    InvalidApiKey = 100,
    ServiceUnavailable = 105,
    WriteOperationFailed = 106,
    InvalidFrob = 108,
    FormatNotFound = 111,
    MethodNotFound = 112,
    BadSoapEnvelope = 114,
    BadXmlRpcCall = 115,
    BadUrl = 116,
}
