//! Shared-secret request signatures.
//!
//! The API authenticates both directions with the same digest: every scalar
//! value in the parameter tree is collected depth-first, the collected
//! strings are sorted, the secret is prepended, and the result is hashed
//! with MD5. Keys never take part. The server computes this independently,
//! so any deviation here surfaces as a rejected request (outbound) or a
//! rejected postback (inbound), never as an error.
//!
//! Scalar conversion rules:
//! - strings are used verbatim
//! - `true`/`false` become `"1"`/`"0"`
//! - `null` becomes the empty string
//! - numbers use their JSON text form

use md5::{Digest, Md5};
use serde_json::{Map, Value};

/// Collect the scalar leaves of `params`, depth-first, in map order.
pub fn signature_values(params: &Map<String, Value>) -> Vec<String> {
    let mut values = Vec::with_capacity(params.len());
    for value in params.values() {
        collect_leaves(value, &mut values);
    }
    values
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::String(s) => out.push(s.clone()),
        Value::Bool(b) => out.push(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Null => out.push(String::new()),
    }
}

/// The pre-image that gets hashed: secret followed by the sorted values.
pub fn signature_string(params: &Map<String, Value>, secret: &str) -> String {
    let mut values = signature_values(params);
    values.sort_unstable();

    let mut out = String::with_capacity(secret.len() + values.iter().map(String::len).sum::<usize>());
    out.push_str(secret);
    for v in &values {
        out.push_str(v);
    }
    out
}

/// Compute the lowercase hex MD5 signature of `params` under `secret`.
///
/// Callers must remove any existing `sig` field first.
pub fn sign(params: &Map<String, Value>, secret: &str) -> String {
    let digest = Md5::digest(signature_string(params, secret).as_bytes());
    format!("{digest:x}")
}

/// Check a supplied signature against `params` (which must not contain `sig`).
pub fn verify_signature(params: &Map<String, Value>, secret: &str, signature: &str) -> bool {
    constant_time_eq(&sign(params, secret), signature)
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
