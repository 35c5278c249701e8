// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token claim decoding.
//!
//! The client never verifies token signatures: the backend checks every
//! request. Claims are read only to drive routing and UI decisions.

use crate::error::DecodeError;
use crate::models::user::id_as_string;
use crate::models::{Role, UserIdentity};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Claims read from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (the user's email on this backend)
    pub subject: Option<String>,
    /// Lowercase role claim
    pub role: Option<Role>,
    /// Expiration time (Unix timestamp)
    pub expires_at: Option<i64>,
    pub user_id: Option<String>,
}

impl Claims {
    /// Build the user identity carried by these claims.
    ///
    /// Returns `None` when the token has no role claim.
    pub fn identity(&self) -> Option<UserIdentity> {
        Some(UserIdentity {
            email: self.subject.clone(),
            role: self.role.clone()?,
            user_id: self.user_id.clone(),
        })
    }
}

/// Raw payload as issued by the backend.
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default, deserialize_with = "id_as_string")]
    sub: Option<String>,
    #[serde(default, deserialize_with = "id_as_string")]
    email: Option<String>,
    #[serde(default, deserialize_with = "id_as_string")]
    role: Option<String>,
    #[serde(default, deserialize_with = "whole_seconds")]
    exp: Option<i64>,
    #[serde(default, alias = "userId", alias = "user_id", deserialize_with = "id_as_string")]
    id: Option<String>,
}

/// Any JSON number as whole seconds, fractions floored. Other types count as absent.
fn whole_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    })
}

/// Decode a token's claims without checking its signature.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let raw = decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation)?.claims;

    Ok(Claims {
        subject: raw.sub.or(raw.email),
        role: raw.role.as_deref().map(Role::parse),
        expires_at: raw.exp,
        user_id: raw.id,
    })
}

/// True iff the claims carry an expiry and `now` has reached it.
///
/// Tokens without `exp` are treated as non-expiring here; the backend still
/// enforces its own expiry on every request.
pub fn is_expired(claims: &Claims, now: i64) -> bool {
    claims.expires_at.is_some_and(|exp| now >= exp)
}
