//! Typed view of upstream API bodies.
//!
//! The REST API answers either with a `{ success, data, message }` wrapper or
//! with a bare payload. Bodies are decoded once into [`ApiEnvelope`] so the
//! rest of the code matches on a variant instead of probing for keys.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    Wrapped {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<T>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, rename = "fromCache", skip_serializing_if = "std::ops::Not::not")]
        from_cache: bool,
    },
    Bare(T),
}

impl<T> ApiEnvelope<T> {
    /// Success-shaped envelope for data served from local storage.
    pub fn from_cache(data: T) -> Self {
        ApiEnvelope::Wrapped { success: true, data: Some(data), message: None, error: None, from_cache: true }
    }

    /// Whether the body was produced from local storage.
    pub fn is_from_cache(&self) -> bool {
        matches!(self, ApiEnvelope::Wrapped { from_cache: true, .. })
    }

    /// Unwrap the payload, turning an unsuccessful wrapper into an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::HttpError` when `success` is false and
    /// `Error::Decode` when a successful wrapper carries no data.
    pub fn into_data(self) -> Result<T, Error> {
        match self {
            ApiEnvelope::Bare(data) => Ok(data),
            ApiEnvelope::Wrapped { success: true, data: Some(data), .. } => Ok(data),
            ApiEnvelope::Wrapped { success: true, data: None, .. } => {
                Err(Error::Decode("successful response carried no data".into()))
            }
            ApiEnvelope::Wrapped { success: false, message, error, .. } => Err(Error::HttpError(
                error.or(message).unwrap_or_else(|| "request was not successful".into()),
            )),
        }
    }
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Decode a response body.
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(Error::from)
    }
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        serde_json::to_value(self).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_decode_wrapped() {
        let body = br#"{"success":true,"data":{"id":"n1"},"message":"ok"}"#;
        let env: ApiEnvelope<Value> = ApiEnvelope::decode(body).unwrap();
        assert!(matches!(env, ApiEnvelope::Wrapped { success: true, .. }));
        assert!(!env.is_from_cache());
        assert_eq!(env.into_data().unwrap(), json!({"id": "n1"}));
    }

    #[test]
    fn test_decode_bare() {
        let env: ApiEnvelope<Vec<Value>> = ApiEnvelope::decode(br#"[{"id":"n1"},{"id":"n2"}]"#).unwrap();
        assert!(matches!(env, ApiEnvelope::Bare(_)));
        assert_eq!(env.into_data().unwrap().len(), 2);
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Summary {
        id: String,
        title: String,
    }

    #[test]
    fn test_decode_payload_without_default() {
        let env: ApiEnvelope<Summary> = ApiEnvelope::decode(br#"{"success":true,"data":{"id":"n1","title":"T"}}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), Summary { id: "n1".into(), title: "T".into() });

        let empty: ApiEnvelope<Summary> = ApiEnvelope::decode(br#"{"success":true}"#).unwrap();
        assert!(matches!(empty, ApiEnvelope::Wrapped { data: None, .. }));
        assert!(matches!(empty.into_data(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_unsuccessful_wrapper_is_error() {
        let env: ApiEnvelope<Value> = ApiEnvelope::decode(br#"{"success":false,"error":"Novel not found"}"#).unwrap();
        let err = env.into_data().unwrap_err();
        assert!(matches!(err, Error::HttpError(msg) if msg == "Novel not found"));
    }

    #[test]
    fn test_from_cache_serialization() {
        let env = ApiEnvelope::from_cache(json!({"id": "n1"}));
        let value = env.to_json().unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": "n1"}, "fromCache": true}));

        let back: ApiEnvelope<Value> = serde_json::from_value(value).unwrap();
        assert!(back.is_from_cache());
    }
}
