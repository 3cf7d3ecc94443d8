//! User-level settings that seed new fields.

use serde::{Deserialize, Serialize};

/// Auto-fill values for name/email/... fields. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: String,
    pub initials: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address: String,
    pub address2: String,
}

/// Defaults applied to newly created text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefaults {
    pub font_family: String,
    pub font_size: f64,
    pub date_format: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 12.0,
            date_format: "MM/DD/YYYY".to_string(),
        }
    }
}
