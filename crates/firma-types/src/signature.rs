use serde::{Deserialize, Serialize};

/// How a signature image was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Draw,
    Type,
    Upload,
}

/// A stored signature image, independent of any document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: String,
    /// Base64 raster image as a data URL
    pub data_url: String,
    #[serde(rename = "type")]
    pub kind: SignatureKind,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}
