//! Request fingerprints used to name fixture files.
//!
//! A fingerprint is two independent digests laid end to end: one of the URL
//! and one of the payload text. String payloads are hashed as-is; any other
//! JSON value is hashed as its compact serialization, whose object keys are
//! always sorted, so equal payloads give equal fingerprints regardless of how
//! they were built.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Text form of a payload as fed to the hash.
pub fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn fingerprint(url: &str, payload: &Value) -> String {
    let mut key = digest(url.as_bytes());
    key.push_str(&digest(payload_text(payload).as_bytes()));
    key
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
