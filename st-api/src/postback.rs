//! Verification of inbound postbacks (webhook-style callbacks).
//!
//! The service signs postbacks with the same shared-secret digest used for
//! outgoing requests. A postback is accepted only when every required field
//! is present, the `action` matches the expected kind, the signature over
//! the remaining fields matches, and (for kinds that reference a send or
//! blast) the referenced resource checks out against a fresh lookup.
//!
//! Rejections are expected for untrusted traffic and are reported as
//! `false`, with the reason logged at warn level.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;
use url::form_urlencoded;

use st_core::constants::{fields, postback};
use st_core::error::StResult;

use crate::client::ApiClient;
use crate::signature;

/// Kinds of postback the service sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostbackKind {
    /// Email verification for a send.
    Verify,
    /// Recipient opted out.
    Optout,
    /// Hard bounce for a send or blast.
    HardBounce,
}

impl PostbackKind {
    /// The `action` discriminator the service sets for this kind.
    pub fn action(&self) -> &'static str {
        match self {
            PostbackKind::Verify => postback::VERIFY,
            PostbackKind::Optout => postback::OPTOUT,
            PostbackKind::HardBounce => postback::HARDBOUNCE,
        }
    }

    /// Fields that must be present for this kind.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            PostbackKind::Verify => &["action", "email", "send_id", fields::SIG],
            PostbackKind::Optout | PostbackKind::HardBounce => &["action", "email", fields::SIG],
        }
    }

    /// Parse a discriminator string.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            postback::VERIFY => Some(PostbackKind::Verify),
            postback::OPTOUT => Some(PostbackKind::Optout),
            postback::HARDBOUNCE => Some(PostbackKind::HardBounce),
            _ => None,
        }
    }
}

impl fmt::Display for PostbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// Parameters of one inbound postback. Consumed by a single verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    params: BTreeMap<String, String>,
}

impl CallbackRequest {
    pub fn new<K, V, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body. Later duplicates win.
    pub fn from_form_body(body: &[u8]) -> Self {
        Self::new(form_urlencoded::parse(body).into_owned())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The supplied signature, if any.
    pub fn signature(&self) -> Option<&str> {
        self.get(fields::SIG)
    }

    /// All parameters except `sig`, in signing form.
    pub fn unsigned_params(&self) -> Map<String, Value> {
        self.params
            .iter()
            .filter(|(k, _)| k.as_str() != fields::SIG)
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Fetches the resources a postback refers to, for cross-checking.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// Fetch a send record by id.
    async fn get_send(&self, send_id: &str) -> StResult<Value>;

    /// Fetch a blast record by id.
    async fn get_blast(&self, blast_id: &str) -> StResult<Value>;
}

/// Why a postback was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingField(&'static str),
    ActionMismatch { expected: &'static str, actual: String },
    BadSignature,
    LookupFailed(String),
    /// The referenced resource lacks an `email` field.
    ResourceWithoutEmail,
    /// The referenced resource is an error envelope.
    ResourceError,
    EmailMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingField(field) => write!(f, "missing field '{field}'"),
            Rejection::ActionMismatch { expected, actual } => {
                write!(f, "action '{actual}' does not match '{expected}'")
            }
            Rejection::BadSignature => f.write_str("signature mismatch"),
            Rejection::LookupFailed(e) => write!(f, "lookup failed: {e}"),
            Rejection::ResourceWithoutEmail => f.write_str("referenced send has no email"),
            Rejection::ResourceError => f.write_str("referenced blast returned an error"),
            Rejection::EmailMismatch => f.write_str("email does not match referenced send"),
        }
    }
}

/// Checks postbacks against a shared secret and a resource lookup.
pub struct PostbackVerifier<'a, L: ResourceLookup + ?Sized> {
    secret: &'a str,
    lookup: &'a L,
}

impl<'a, L: ResourceLookup + ?Sized> PostbackVerifier<'a, L> {
    pub fn new(secret: &'a str, lookup: &'a L) -> Self {
        Self { secret, lookup }
    }

    /// Verify `request` as a postback of `kind`. Never errors.
    pub async fn verify(&self, kind: PostbackKind, request: &CallbackRequest) -> bool {
        match self.check(kind, request).await {
            Ok(()) => true,
            Err(rejection) => {
                warn!("rejected {kind} postback: {rejection}");
                false
            }
        }
    }

    /// Full check with the rejection reason.
    pub async fn check(&self, kind: PostbackKind, request: &CallbackRequest) -> Result<(), Rejection> {
        check_signature(kind, request, self.secret)?;

        match kind {
            PostbackKind::Optout => Ok(()),
            PostbackKind::Verify => {
                // Presence checked above.
                let send_id = request.get("send_id").unwrap_or_default();
                let send = self.fetch_send(send_id).await?;
                let recorded = send
                    .get("email")
                    .and_then(Value::as_str)
                    .ok_or(Rejection::ResourceWithoutEmail)?;
                if Some(recorded) != request.get("email") {
                    return Err(Rejection::EmailMismatch);
                }
                Ok(())
            }
            PostbackKind::HardBounce => {
                if let Some(send_id) = request.get("send_id") {
                    let send = self.fetch_send(send_id).await?;
                    if send.get("email").map_or(true, Value::is_null) {
                        return Err(Rejection::ResourceWithoutEmail);
                    }
                } else if let Some(blast_id) = request.get("blast_id") {
                    let blast = self
                        .lookup
                        .get_blast(blast_id)
                        .await
                        .map_err(|e| Rejection::LookupFailed(e.to_string()))?;
                    if blast.get("error").is_some_and(|e| !e.is_null()) {
                        return Err(Rejection::ResourceError);
                    }
                }
                Ok(())
            }
        }
    }

    async fn fetch_send(&self, send_id: &str) -> Result<Value, Rejection> {
        self.lookup
            .get_send(send_id)
            .await
            .map_err(|e| Rejection::LookupFailed(e.to_string()))
    }
}

/// Structural and signature checks, without any resource lookup.
pub fn check_signature(
    kind: PostbackKind,
    request: &CallbackRequest,
    secret: &str,
) -> Result<(), Rejection> {
    for field in kind.required_fields() {
        if request.get(field).is_none() {
            return Err(Rejection::MissingField(*field));
        }
    }

    let action = request.get("action").unwrap_or_default();
    if action != kind.action() {
        return Err(Rejection::ActionMismatch {
            expected: kind.action(),
            actual: action.to_string(),
        });
    }

    let supplied = request.signature().unwrap_or_default();
    if !signature::verify_signature(&request.unsigned_params(), secret, supplied) {
        return Err(Rejection::BadSignature);
    }
    Ok(())
}

impl ApiClient {
    /// Verify a postback of `kind` using this client's secret, re-fetching
    /// referenced sends and blasts through this client.
    pub async fn verify_postback(&self, kind: PostbackKind, request: &CallbackRequest) -> bool {
        PostbackVerifier::new(self.credentials().api_secret(), self)
            .verify(kind, request)
            .await
    }

    /// Whether `request` is an authenticated verify postback.
    pub async fn receive_verify_post(&self, request: &CallbackRequest) -> bool {
        self.verify_postback(PostbackKind::Verify, request).await
    }

    /// Whether `request` is an authenticated optout postback.
    pub async fn receive_optout_post(&self, request: &CallbackRequest) -> bool {
        self.verify_postback(PostbackKind::Optout, request).await
    }

    /// Whether `request` is an authenticated hard bounce postback.
    pub async fn receive_hardbounce_post(&self, request: &CallbackRequest) -> bool {
        self.verify_postback(PostbackKind::HardBounce, request).await
    }
}
