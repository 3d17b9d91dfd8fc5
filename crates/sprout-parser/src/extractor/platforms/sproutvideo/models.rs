use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer};

use crate::extractor::error::ExtractorError;

/// Player configuration embedded in the embed page as `var dat = '<base64>';`.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyPayload {
    /// Subdomain of the storage host, e.g. "cdn1"
    pub base: String,
    pub s3_user_hash: String,
    pub s3_video_hash: String,
    pub title: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub signatures: Signatures,
}

/// CloudFront signing fields, one entry per purpose.
#[derive(Debug, Clone, Deserialize)]
pub struct Signatures {
    /// manifest access
    pub m: SignatureFields,
    /// key access
    pub k: SignatureFields,
    /// segment access
    pub t: SignatureFields,
}

/// Signing fields in the order they appear in the payload.
///
/// Repeated names are kept as-is; [`format_signature_fields`] collapses them.
///
/// [`format_signature_fields`]: super::signing::format_signature_fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureFields(Vec<(String, SignatureValue)>);

impl SignatureFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignatureValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Last value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&SignatureValue> {
        self.0
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SignatureValue)> for SignatureFields {
    fn from_iter<I: IntoIterator<Item = (String, SignatureValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for SignatureFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{MapAccess, Visitor};

        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = SignatureFields;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of signing fields")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, SignatureValue>()? {
                    fields.push(entry);
                }
                Ok(SignatureFields(fields))
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// A single signing value as it appears in the payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SignatureScalar {
    Text(String),
    // e.g. CloudFront-Expires
    Number(serde_json::Number),
    Flag(bool),
}

impl fmt::Display for SignatureScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureScalar::Text(text) => f.write_str(text),
            SignatureScalar::Number(number) => write!(f, "{number}"),
            SignatureScalar::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for SignatureScalar {
    fn from(text: &str) -> Self {
        SignatureScalar::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SignatureValue {
    One(SignatureScalar),
    Many(Vec<SignatureScalar>),
}

impl SignatureValue {
    pub fn values(&self) -> &[SignatureScalar] {
        match self {
            SignatureValue::One(value) => std::slice::from_ref(value),
            SignatureValue::Many(values) => values,
        }
    }
}

impl PolicyPayload {
    /// Decodes standard (not url-safe) base64 text into a payload.
    pub fn decode(data: &str) -> Result<Self, ExtractorError> {
        let bytes = STANDARD.decode(data.trim())?;
        let text = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn test_decode_payload() {
        let json = r#"{
            "base": "cdn1",
            "s3_user_hash": "u1",
            "s3_video_hash": "v1",
            "title": "Berlin, des communautés aux communs",
            "sessionID": "abc",
            "signatures": {
                "m": {"CloudFront-Policy": "P", "CloudFront-Signature": "S"},
                "k": {"CloudFront-Key-Pair-Id": ["a", "b"]},
                "t": {}
            },
            "hls": true
        }"#;

        let payload = PolicyPayload::decode(&encode(json)).unwrap();
        assert_eq!(payload.base, "cdn1");
        assert_eq!(payload.session_id, "abc");
        assert_eq!(payload.title, "Berlin, des communautés aux communs");
        assert_eq!(
            payload.signatures.m.get("CloudFront-Policy"),
            Some(&SignatureValue::One("P".into()))
        );
        assert_eq!(
            payload.signatures.k.get("CloudFront-Key-Pair-Id").unwrap().values(),
            [SignatureScalar::from("a"), SignatureScalar::from("b")]
        );
        assert!(payload.signatures.t.is_empty());
    }

    #[test]
    fn test_fields_keep_payload_order() {
        let json = r#"{"base":"b","s3_user_hash":"u","s3_video_hash":"v","title":"t",
            "sessionID":"s","signatures":{
                "m":{"CloudFront-Signature":"S","CloudFront-Policy":"P","CloudFront-Key-Pair-Id":"K"},
                "k":{},"t":{}}}"#;
        let payload = PolicyPayload::decode(&encode(json)).unwrap();

        let names: Vec<&str> = payload.signatures.m.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "CloudFront-Signature",
                "CloudFront-Policy",
                "CloudFront-Key-Pair-Id"
            ]
        );
    }

    #[test]
    fn test_numeric_and_boolean_values() {
        let json = r#"{"base":"b","s3_user_hash":"u","s3_video_hash":"v","title":"t",
            "sessionID":"s","signatures":{
                "m":{"CloudFront-Expires":1700000000,"CloudFront-Secure":true},
                "k":{"CloudFront-Expires":[1,"2"]},"t":{}}}"#;
        let payload = PolicyPayload::decode(&encode(json)).unwrap();

        let expires = payload.signatures.m.get("CloudFront-Expires").unwrap();
        assert_eq!(expires.values()[0].to_string(), "1700000000");
        let secure = payload.signatures.m.get("CloudFront-Secure").unwrap();
        assert_eq!(secure.values()[0].to_string(), "true");

        let rendered: Vec<String> = payload
            .signatures
            .k
            .get("CloudFront-Expires")
            .unwrap()
            .values()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, vec!["1", "2"]);
    }

    #[test]
    fn test_object_value_is_rejected() {
        let json = r#"{"base":"b","s3_user_hash":"u","s3_video_hash":"v","title":"t",
            "sessionID":"s","signatures":{"m":{"CloudFront-Policy":{"a":1}},"k":{},"t":{}}}"#;
        let err = PolicyPayload::decode(&encode(json)).unwrap_err();
        assert!(matches!(err, ExtractorError::JsonError(_)));
    }

    #[test]
    fn test_missing_signature_purpose_is_rejected() {
        let json = r#"{"base":"b","s3_user_hash":"u","s3_video_hash":"v","title":"t",
            "sessionID":"s","signatures":{"m":{},"k":{}}}"#;
        let err = PolicyPayload::decode(&encode(json)).unwrap_err();
        assert!(matches!(err, ExtractorError::JsonError(_)));
        assert!(err.to_string().contains("`t`"));
    }

    #[test]
    fn test_bad_base64() {
        let err = PolicyPayload::decode("not*base64!").unwrap_err();
        assert!(matches!(err, ExtractorError::Base64Error(_)));
    }

    #[test]
    fn test_bad_utf8() {
        let err = PolicyPayload::decode(&STANDARD.encode([0xff, 0xfe, 0xfd])).unwrap_err();
        assert!(matches!(err, ExtractorError::Utf8Error(_)));
    }

    #[test]
    fn test_bad_json() {
        let err = PolicyPayload::decode(&encode("{not json")).unwrap_err();
        assert!(matches!(err, ExtractorError::JsonError(_)));
    }
}
