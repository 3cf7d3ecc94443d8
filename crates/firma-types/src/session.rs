use serde::{Deserialize, Serialize};

use crate::fields::{SignatureField, TextField};

/// Saved annotations for one source document, keyed by its content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub hash: String,
    #[serde(default)]
    pub text_fields: Vec<TextField>,
    #[serde(default)]
    pub signature_fields: Vec<SignatureField>,
    /// Milliseconds since the Unix epoch
    pub last_modified: i64,
    #[serde(default)]
    pub file_name: String,
}
