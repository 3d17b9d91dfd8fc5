use url::form_urlencoded;

use super::models::{PolicyPayload, SignatureFields, SignatureValue};

/// Prefix carried by every CloudFront signing field in the payload.
pub const SIGNATURE_PREFIX: &str = "CloudFront-";

const SESSION_ID_KEY: &str = "sessionID";

/// Which CloudFront signature a query string is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePurpose {
    /// `m`, playlist requests
    Manifest,
    /// `k`, decryption key requests
    Key,
    /// `t`, media segment requests
    Segment,
}

impl SignaturePurpose {
    pub fn fields<'a>(&self, payload: &'a PolicyPayload) -> &'a SignatureFields {
        match self {
            SignaturePurpose::Manifest => &payload.signatures.m,
            SignaturePurpose::Key => &payload.signatures.k,
            SignaturePurpose::Segment => &payload.signatures.t,
        }
    }
}

/// Removes the CloudFront prefix once, leaving other names untouched.
pub fn strip_signature_prefix(name: &str) -> &str {
    name.strip_prefix(SIGNATURE_PREFIX).unwrap_or(name)
}

/// Renames signing fields for reuse in a query string.
///
/// Fields keep payload order. When two names collapse to the same stripped
/// name, the later value replaces the earlier one in its original position.
pub fn format_signature_fields(fields: &SignatureFields) -> Vec<(&str, &SignatureValue)> {
    let mut formatted: Vec<(&str, &SignatureValue)> = Vec::with_capacity(fields.len());
    for (name, value) in fields.iter() {
        let name = strip_signature_prefix(name);
        match formatted.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => formatted.push((name, value)),
        }
    }
    formatted
}

/// Builds the query string for one purpose: stripped signing fields plus `sessionID`.
///
/// List values are encoded as repeated keys. A signing field already named
/// `sessionID` is overwritten in place by the payload's session id.
pub fn policy_to_query(payload: &PolicyPayload, purpose: SignaturePurpose) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut session_written = false;
    for (name, value) in format_signature_fields(purpose.fields(payload)) {
        if name == SESSION_ID_KEY {
            serializer.append_pair(name, &payload.session_id);
            session_written = true;
            continue;
        }
        for v in value.values() {
            serializer.append_pair(name, &v.to_string());
        }
    }
    if !session_written {
        serializer.append_pair(SESSION_ID_KEY, &payload.session_id);
    }
    serializer.finish()
}

/// The three signed query strings needed to play one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningQueries {
    pub manifest: String,
    pub key: String,
    pub segment: String,
}

impl SigningQueries {
    pub fn from_payload(payload: &PolicyPayload) -> Self {
        Self {
            manifest: policy_to_query(payload, SignaturePurpose::Manifest),
            key: policy_to_query(payload, SignaturePurpose::Key),
            segment: policy_to_query(payload, SignaturePurpose::Segment),
        }
    }
}
