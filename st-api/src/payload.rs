//! Signed request payloads.
//!
//! Every request carries exactly four text fields: `api_key`, `format`,
//! `json` (the serialized parameters) and `sig`. The signature covers the
//! first three only. File uploads travel as extra multipart fields outside
//! the signed scope.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use url::form_urlencoded;

use st_core::config::Credentials;
use st_core::constants::{fields, FORMAT_JSON};
use st_core::error::StResult;

use crate::signature;

/// Parameters of a single API action. Insertion order is preserved.
pub type ParameterSet = Map<String, Value>;

/// A parameter extracted for upload as raw file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileField {
    /// Payload field name (e.g. "file").
    pub name: String,
    /// Local path whose contents are sent.
    pub path: PathBuf,
}

impl FileField {
    /// File name reported in the multipart part.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Transport-ready representation of one request. Built fresh per request.
#[derive(Debug, Clone)]
pub struct Payload {
    api_key: String,
    json: String,
    sig: String,
    files: Vec<FileField>,
}

impl Payload {
    /// Build a signed payload from `data`.
    ///
    /// Each name in `binary_fields` whose value is a path to an existing
    /// regular file is moved out of `data` and sent as file content. Names
    /// that are absent, not strings, or not real files stay in `data` as
    /// ordinary values.
    pub fn build(
        credentials: &Credentials,
        mut data: ParameterSet,
        binary_fields: &[&str],
    ) -> StResult<Self> {
        let mut files = Vec::new();
        for name in binary_fields {
            let path = match data.get(*name) {
                Some(Value::String(p)) if Path::new(p).is_file() => PathBuf::from(p),
                _ => continue,
            };
            data.remove(*name);
            files.push(FileField {
                name: (*name).to_string(),
                path,
            });
        }

        let json = serde_json::to_string(&data)?;

        let mut signed = Map::with_capacity(3);
        signed.insert(fields::API_KEY.into(), Value::String(credentials.api_key().into()));
        signed.insert(fields::FORMAT.into(), Value::String(FORMAT_JSON.into()));
        signed.insert(fields::JSON.into(), Value::String(json.clone()));
        let sig = signature::sign(&signed, credentials.api_secret());

        Ok(Self {
            api_key: credentials.api_key().to_string(),
            json,
            sig,
            files,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn format(&self) -> &str {
        FORMAT_JSON
    }

    /// The serialized parameter blob.
    pub fn json(&self) -> &str {
        &self.json
    }

    pub fn sig(&self) -> &str {
        &self.sig
    }

    /// Whether any parameter was extracted for upload.
    pub fn is_file_upload(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn files(&self) -> &[FileField] {
        &self.files
    }

    /// Names of the upload fields, for error reporting.
    pub fn file_field_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }

    /// The four text fields, in wire order.
    pub fn text_fields(&self) -> [(&'static str, &str); 4] {
        [
            (fields::API_KEY, self.api_key.as_str()),
            (fields::FORMAT, FORMAT_JSON),
            (fields::JSON, self.json.as_str()),
            (fields::SIG, self.sig.as_str()),
        ]
    }

    /// The text fields as an `application/x-www-form-urlencoded` string.
    /// Used both as a POST body and as a GET query string.
    pub fn urlencoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.text_fields())
            .finish()
    }
}

/// Append an encoded query to `url`, respecting an existing query part.
pub(crate) fn url_with_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}
