// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend response envelope `{ok, data?, error?, message?}`.
//!
//! Some endpoints nest their payload under `data`, others return it flat next
//! to `ok`. [`Envelope::from_value`] accepts both so callers only ever see the
//! nested form.

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

const ENVELOPE_KEYS: [&str; 4] = ["ok", "data", "error", "message"];

/// Standard backend envelope with a typed payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Parse a raw response body into an envelope.
    ///
    /// When `data` is absent, every non-envelope top-level field is treated as
    /// the payload.
    pub fn from_value(body: Value) -> Result<Self, ApiError> {
        let Value::Object(mut map) = body else {
            return Err(ApiError::InvalidResponse(
                "expected a JSON object envelope".to_string(),
            ));
        };

        let ok = match map.get("ok") {
            Some(Value::Bool(ok)) => *ok,
            Some(_) => {
                return Err(ApiError::InvalidResponse(
                    "envelope field `ok` is not a boolean".to_string(),
                ))
            }
            None => {
                return Err(ApiError::InvalidResponse(
                    "envelope is missing `ok`".to_string(),
                ))
            }
        };

        let error = take_string(&mut map, "error");
        let message = take_string(&mut map, "message");

        let data_value = match map.remove("data") {
            Some(Value::Null) | None => {
                let rest: serde_json::Map<String, Value> = map
                    .into_iter()
                    .filter(|(k, _)| !ENVELOPE_KEYS.contains(&k.as_str()))
                    .collect();
                if rest.is_empty() {
                    None
                } else {
                    Some(Value::Object(rest))
                }
            }
            Some(data) => Some(data),
        };

        let data = data_value
            .map(serde_json::from_value::<T>)
            .transpose()
            .map_err(|e| ApiError::InvalidResponse(format!("envelope payload: {}", e)))?;

        Ok(Self {
            ok,
            data,
            error,
            message,
        })
    }

    /// Collapse the envelope into its payload, or a validation error carrying
    /// the backend's own message.
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.ok, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::InvalidResponse(
                "successful envelope without payload".to_string(),
            )),
            (false, _) => Err(ApiError::Validation {
                status: 200,
                message: self.message.or(self.error),
            }),
        }
    }
}

fn take_string(map: &mut serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
