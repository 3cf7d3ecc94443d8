//! Signature library: stored signature images that fields reference by id.

use firma_types::{Signature, SignatureKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureLibrary {
    signatures: Vec<Signature>,
}

impl SignatureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signature with a fresh id and the current timestamp.
    pub fn create(&mut self, kind: SignatureKind, data_url: String) -> &Signature {
        let signature = Signature {
            id: uuid::Uuid::new_v4().to_string(),
            data_url,
            kind,
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        self.add(signature)
    }

    pub fn add(&mut self, signature: Signature) -> &Signature {
        self.signatures.push(signature);
        &self.signatures[self.signatures.len() - 1]
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.signatures.len();
        self.signatures.retain(|s| s.id != id);
        self.signatures.len() != before
    }

    pub fn clear(&mut self) {
        self.signatures.clear();
    }

    pub fn get(&self, id: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.id == id)
    }

    pub fn list(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
