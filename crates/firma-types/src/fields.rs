//! Field records placed on top of a document.
//!
//! Positions are normalized anchors (fractions of the page width and height,
//! origin top-left). Width and height are in page units and are not scaled
//! with zoom.

use serde::{Deserialize, Serialize};

pub type FieldId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    FullName,
    Initials,
    Email,
    Phone,
    Company,
    Address,
    Address2,
    Checkbox,
    Radio,
    #[serde(rename = "x")]
    XMark,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::Text,
        FieldType::Date,
        FieldType::FullName,
        FieldType::Initials,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Company,
        FieldType::Address,
        FieldType::Address2,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::XMark,
    ];

    /// Human-readable label used in notifications ("Date field added").
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Date => "Date",
            FieldType::FullName => "Full name",
            FieldType::Initials => "Initials",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone",
            FieldType::Company => "Company",
            FieldType::Address => "Address",
            FieldType::Address2 => "Address 2",
            FieldType::Checkbox => "Checkbox",
            FieldType::Radio => "Radio",
            FieldType::XMark => "X",
        }
    }

    /// Parse the serialized name (`"fullName"`, `"x"`, ...).
    pub fn from_name(name: &str) -> Option<FieldType> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::FullName => "fullName",
            FieldType::Initials => "initials",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Company => "company",
            FieldType::Address => "address",
            FieldType::Address2 => "address2",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::XMark => "x",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextField {
    pub id: FieldId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Set on creation, cleared by the first interaction. Controls edit chrome only.
    #[serde(default)]
    pub is_new: bool,
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub is_underline: bool,
    #[serde(default)]
    pub is_strikethrough: bool,
    pub page: u32,
    #[serde(default)]
    pub field_type: FieldType,
}

impl TextField {
    /// Fields whose text is empty or whitespace-only are never drawn.
    pub fn has_visible_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureField {
    pub id: FieldId,
    /// Back-reference into the signature library
    pub signature_id: String,
    pub data_url: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page: u32,
    #[serde(default)]
    pub is_new: bool,
}
