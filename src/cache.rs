/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::errors::FlickrError;
use crate::params::ParameterSet;
use crate::response::ResponseFormat;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Parameters that change on every request and must never influence the
/// cache identity of a call.
const VOLATILE_PARAMS: [&str; 3] = ["oauth_nonce", "oauth_timestamp", "oauth_signature"];

/// One stored response payload, kept verbatim in the format it arrived in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: String,
    pub format: ResponseFormat,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store of raw API responses keyed by request identity.
///
/// The identity of a request is derived from its method name and parameters
/// after dropping the volatile signing parameters, so a repeated call hits
/// the same entry even though its nonce, timestamp and signature differ.
/// The store can be persisted to disk and reloaded between runs.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    key_filter: BTreeSet<String>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            key_filter: VOLATILE_PARAMS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Replaces the set of parameter names excluded from key derivation.
    ///
    /// A replacement set should still contain `oauth_nonce`, `oauth_timestamp`
    /// and `oauth_signature`; keying on any of those makes every call a miss.
    pub fn set_key_filter<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_filter = names.into_iter().map(Into::into).collect();
    }

    /// Derives the cache key for a call: the canonical query of the filtered
    /// parameters plus the method name, hashed to a hex digest.
    pub fn derive_key(&self, method: &str, params: &ParameterSet) -> String {
        let mut identity: ParameterSet = params
            .iter()
            .filter(|(name, _)| !self.key_filter.contains(*name))
            .collect();
        identity.insert("method", method);
        hex::encode(Sha1::digest(identity.canonical_query().as_bytes()))
    }

    /// Looks up a live entry. An expired entry is evicted and reported as a
    /// miss.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(Utc::now()))
        {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }

    /// Stores a payload under `key`, replacing any previous entry. With no
    /// TTL the entry never expires.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        payload: impl Into<String>,
        format: ResponseFormat,
        ttl: Option<Duration>,
    ) {
        let entry = CacheEntry {
            payload: payload.into(),
            format,
            expires_at: ttl.map(|ttl| Utc::now() + ttl),
        };
        self.entries.insert(key.into(), entry);
    }

    pub fn invalidate(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the entries with the contents of a persisted store.
    ///
    /// A missing file is an [`FlickrError::Io`] miss the caller may choose to
    /// ignore; unreadable contents are [`FlickrError::StoreCorrupt`].
    pub fn load_from(&mut self, path: &Path) -> Result<(), FlickrError> {
        let raw = fs::read_to_string(path)?;
        let entries: HashMap<String, CacheEntry> =
            serde_json::from_str(&raw).map_err(|e| FlickrError::StoreCorrupt {
                detail: e.to_string(),
            })?;
        self.entries = entries;
        Ok(())
    }

    /// Writes the entries to disk, atomically replacing any previous store.
    pub fn save_to(&self, path: &Path) -> Result<(), FlickrError> {
        let encoded =
            serde_json::to_string_pretty(&self.entries).map_err(|e| FlickrError::StoreCorrupt {
                detail: format!("failed to encode store: {e}"),
            })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(encoded.as_bytes())?;
        file.persist(path).map_err(|e| FlickrError::Io(e.error))?;
        Ok(())
    }
}
