/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Wire name of the signature algorithm, sent as `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Protocol version sent as `oauth_version`.
pub const PROTOCOL_VERSION: &str = "1.0";

const NONCE_LEN: usize = 16;

/// Builds the signing secret the service verifies against:
/// `consumer_secret&token_secret`, with the token part empty when no token is
/// held yet.
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    format!("{}&{}", consumer_secret, token_secret.unwrap_or(""))
}

/// Signs a canonical parameter string with the shared secret.
///
/// HMAC-SHA1 keyed by `secret` over the exact bytes of `canonical`, encoded
/// as standard base64. The canonical string must be the one that will be
/// transmitted, including the `method` parameter, or the service will reject
/// the signature. See [`ParameterSet::canonical_query`](crate::ParameterSet::canonical_query).
pub fn sign(secret: &str, canonical: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(canonical.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Fresh per-request nonce, sent as `oauth_nonce`.
pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Current Unix time in seconds, sent as `oauth_timestamp`.
pub fn timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_is_deterministic() {
        let canonical = "api_key=abc&method=flickr.test.echo&oauth_nonce=x";
        assert_eq!(sign("secret&", canonical), sign("secret&", canonical));
    }

    #[test]
    fn any_parameter_change_changes_the_signature() {
        let base = sign("secret&", "a=1&b=2");
        assert_ne!(base, sign("secret&", "a=1&b=3"));
        assert_ne!(base, sign("secret&", "a=1&b=2&c=3"));
        assert_ne!(base, sign("other&", "a=1&b=2"));
    }

    #[test]
    fn known_hmac_sha1_vector() {
        // RFC 2202 style vector: HMAC-SHA1("key", "The quick brown fox ...")
        let sig = sign("key", "The quick brown fox jumps over the lazy dog");
        assert_eq!(sig, "3nybhbi3iqa8ino29wqQcBydtNk=");
    }

    #[test]
    fn signing_key_forms() {
        assert_eq!(signing_key("abc", Some("xyz")), "abc&xyz");
        assert_eq!(signing_key("abc", None), "abc&");
    }

    #[test]
    fn nonces_are_alphanumeric_and_distinct() {
        let a = nonce();
        let b = nonce();
        assert_eq!(a.len(), NONCE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
