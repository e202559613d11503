use std::sync::{Mutex, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::clock::{Clock, Millis};
use crate::error::Error;

/// Safety margin subtracted from `exp` before a token counts as expired.
pub const DEFAULT_EXPIRY_MARGIN_MS: Millis = 60_000;

/// How long decoded claims stay memoized for an unchanged token.
pub const DECODE_CACHE_TTL_MS: Millis = 10_000;

/// How long an expired/not-expired verdict stays memoized.
pub const EXPIRY_CACHE_TTL_MS: Millis = 5_000;

/// Claims read from a bearer token payload.
///
/// The signature is not verified here: the backend does that on every
/// request. The dashboard only needs `exp` to know when to stop sending the
/// token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, JsonValue>,
}

impl TokenClaims {
    /// Absolute expiry in milliseconds, if the token carries `exp`.
    #[must_use]
    pub fn expires_at_ms(&self) -> Option<Millis> {
        self.exp.and_then(|exp| exp.checked_mul(1_000))
    }

    /// Gets any other claim by key.
    #[must_use]
    pub fn get_claim(&self, key: &str) -> Option<&JsonValue> {
        self.extra.get(key)
    }
}

/// Decodes the payload segment of a `header.payload.signature` token.
///
/// # Errors
///
/// Returns `Error::Token` if the token does not have exactly three segments,
/// the payload is not base64url, or it is not a JSON object.
pub fn decode_claims(token: &str) -> Result<TokenClaims, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::Token(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    }

    // Accept both alphabets and optional padding; issuers differ.
    let payload_b64: String = parts[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    if payload_b64.is_empty() {
        return Err(Error::Token("empty payload".into()));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|e| Error::Token(format!("invalid payload encoding: {e}")))?;
    serde_json::from_slice(&payload).map_err(|e| Error::Token(format!("invalid payload: {e}")))
}

/// Whether `token` must be treated as expired at `now_ms`.
///
/// Fails closed: a token that cannot be decoded or has no `exp` is expired.
#[must_use]
pub fn is_token_expired(token: &str, now_ms: Millis, margin_ms: Millis) -> bool {
    match decode_claims(token).ok().and_then(|c| c.expires_at_ms()) {
        Some(expires_at) => now_ms >= expires_at.saturating_sub(margin_ms),
        None => true,
    }
}

struct DecodedEntry {
    token: String,
    claims: TokenClaims,
    expires_at_ms: Option<Millis>,
    cached_at_ms: Millis,
}

struct ExpiryEntry {
    token: String,
    expired: bool,
    cached_at_ms: Millis,
}

#[derive(Default)]
struct Slots {
    decoded: Option<DecodedEntry>,
    expiry: Option<ExpiryEntry>,
}

/// Single-slot memoizing decoder.
///
/// Holds at most one decoded token and one expiry verdict. A lookup hits only
/// when the token string is identical and the entry is younger than its TTL.
pub struct TokenDecoder<C> {
    clock: C,
    margin_ms: Millis,
    slots: Mutex<Slots>,
}

impl<C: Clock> TokenDecoder<C> {
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            margin_ms: DEFAULT_EXPIRY_MARGIN_MS,
            slots: Mutex::new(Slots::default()),
        }
    }

    #[must_use]
    pub fn with_margin_ms(mut self, margin_ms: Millis) -> Self {
        self.margin_ms = margin_ms;
        self
    }

    #[must_use]
    pub fn margin_ms(&self) -> Millis {
        self.margin_ms
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Decoded claims for `token`, or `None` if it cannot be decoded.
    ///
    /// A decode failure also empties the cache.
    pub fn decode(&self, token: &str) -> Option<TokenClaims> {
        self.decode_entry(token).map(|(claims, _)| claims)
    }

    /// Absolute expiry of `token` in milliseconds.
    pub fn expires_at_ms(&self, token: &str) -> Option<Millis> {
        self.decode_entry(token).and_then(|(_, exp)| exp)
    }

    /// Milliseconds left before `exp`, negative once past it.
    pub fn remaining_ms(&self, token: &str) -> Option<Millis> {
        self.expires_at_ms(token)
            .map(|exp| exp - self.clock.now_ms())
    }

    /// Whether `token` must be treated as expired now, margin included.
    pub fn is_expired(&self, token: &str) -> bool {
        let now = self.clock.now_ms();
        {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = &slots.expiry
                && entry.token == token
                && now - entry.cached_at_ms < EXPIRY_CACHE_TTL_MS
            {
                return entry.expired;
            }
        }

        let expired = match self.expires_at_ms(token) {
            Some(expires_at) => now >= expires_at.saturating_sub(self.margin_ms),
            None => true,
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.expiry = Some(ExpiryEntry {
            token: token.to_owned(),
            expired,
            cached_at_ms: now,
        });
        expired
    }

    /// Drops both cached entries.
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        *slots = Slots::default();
    }

    fn decode_entry(&self, token: &str) -> Option<(TokenClaims, Option<Millis>)> {
        let now = self.clock.now_ms();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = &slots.decoded
            && entry.token == token
            && now - entry.cached_at_ms < DECODE_CACHE_TTL_MS
        {
            return Some((entry.claims.clone(), entry.expires_at_ms));
        }

        match decode_claims(token) {
            Ok(claims) => {
                let expires_at_ms = claims.expires_at_ms();
                slots.decoded = Some(DecodedEntry {
                    token: token.to_owned(),
                    claims: claims.clone(),
                    expires_at_ms,
                    cached_at_ms: now,
                });
                Some((claims, expires_at_ms))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token decode failed");
                *slots = Slots::default();
                None
            }
        }
    }
}

/// Builds an unsigned `header.payload.sig` token for tests.
#[cfg(test)]
pub(crate) fn test_token(payload: &JsonValue) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// Token expiring at `exp_ms` (rounded down to whole seconds).
#[cfg(test)]
pub(crate) fn token_expiring_at(exp_ms: Millis) -> String {
    test_token(&serde_json::json!({
        "sub": "1",
        "iat": (exp_ms / 1_000) - 3_600,
        "exp": exp_ms / 1_000,
    }))
}
