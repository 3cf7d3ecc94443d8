//! Field store
//!
//! Holds the text fields and signature placements of the open document. Fields
//! are independent of each other; the only cross-field state is the "active"
//! pointer and the transient `is_new` flags that drive edit chrome.

use chrono::NaiveDate;
use firma_types::{
    DocumentState, FieldDefaults, FieldId, FieldType, PageView, SignatureField, Size, TextField,
    UserProfile,
};
use serde::{Deserialize, Serialize};

use crate::coords::{normalize, ScreenPoint};
use crate::dates::format_date;
use crate::error::FirmaError;
use crate::signatures::SignatureLibrary;

/// Where new fields appear, as a normalized anchor.
pub const NEW_FIELD_ANCHOR: (f64, f64) = (0.5, 0.35);
pub const NEW_FIELD_COLOR: &str = "#000000";
/// Provisional signature box until the image has been measured.
pub const SIGNATURE_WIDTH: f64 = 150.0;
pub const SIGNATURE_HEIGHT: f64 = 75.0;

/// Inputs used to seed a new field's text and size.
#[derive(Debug, Clone, Copy)]
pub struct FieldSeed<'a> {
    pub profile: &'a UserProfile,
    pub defaults: &'a FieldDefaults,
    pub today: NaiveDate,
}

/// A single-property edit on a text field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    Text(String),
    FontFamily(String),
    FontSize(f64),
    Color(String),
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Strikethrough(bool),
    Page(u32),
}

impl FieldPatch {
    fn apply(self, field: &mut TextField) {
        match self {
            FieldPatch::Text(text) => field.text = text,
            FieldPatch::FontFamily(family) => field.font_family = family,
            FieldPatch::FontSize(size) => field.font_size = size,
            FieldPatch::Color(color) => field.color = color,
            FieldPatch::Bold(v) => field.is_bold = v,
            FieldPatch::Italic(v) => field.is_italic = v,
            FieldPatch::Underline(v) => field.is_underline = v,
            FieldPatch::Strikethrough(v) => field.is_strikethrough = v,
            FieldPatch::Page(page) => field.page = page.max(1),
        }
    }
}

struct Seeded {
    text: String,
    width: f64,
    height: f64,
    font_size: f64,
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

fn seed_for(field_type: FieldType, seed: &FieldSeed<'_>) -> Seeded {
    let profile = seed.profile;
    let size = seed.defaults.font_size;
    let sized = |text: String, width: f64, height: f64| Seeded {
        text,
        width,
        height,
        font_size: size,
    };
    let glyph = |text: &str, width: f64| Seeded {
        text: text.to_string(),
        width,
        height: 24.0,
        font_size: 16.0,
    };

    match field_type {
        FieldType::Date => sized(format_date(seed.today, &seed.defaults.date_format), 140.0, 40.0),
        FieldType::FullName => sized(or_placeholder(&profile.name, "Full Name"), 200.0, 40.0),
        FieldType::Initials => sized(or_placeholder(&profile.initials, "AB"), 60.0, 40.0),
        FieldType::Email => sized(
            or_placeholder(&profile.email, "email@example.com"),
            220.0,
            40.0,
        ),
        FieldType::Phone => sized(or_placeholder(&profile.phone, "(555) 000-0000"), 160.0, 40.0),
        FieldType::Company => sized(or_placeholder(&profile.company, "Company Name"), 200.0, 40.0),
        FieldType::Address => sized(or_placeholder(&profile.address, "Address"), 250.0, 60.0),
        FieldType::Address2 => sized(or_placeholder(&profile.address2, "Address 2"), 250.0, 60.0),
        FieldType::Checkbox => glyph("✓", 14.0),
        FieldType::Radio => glyph("⏺", 24.0),
        FieldType::XMark => glyph("✕", 24.0),
        FieldType::Text => sized("New text".to_string(), 120.0, 40.0),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStore {
    text_fields: Vec<TextField>,
    signature_fields: Vec<SignatureField>,
    active_field_id: Option<FieldId>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_fields(&self) -> &[TextField] {
        &self.text_fields
    }

    pub fn signature_fields(&self) -> &[SignatureField] {
        &self.signature_fields
    }

    pub fn active_field_id(&self) -> Option<&str> {
        self.active_field_id.as_deref()
    }

    pub fn set_active_field(&mut self, id: Option<FieldId>) {
        self.active_field_id = id;
    }

    pub fn text_field(&self, id: &str) -> Option<&TextField> {
        self.text_fields.iter().find(|f| f.id == id)
    }

    pub fn signature_field(&self, id: &str) -> Option<&SignatureField> {
        self.signature_fields.iter().find(|f| f.id == id)
    }

    /// Text and signature fields declared on `page`, for rendering.
    pub fn fields_on_page(&self, page: u32) -> (Vec<&TextField>, Vec<&SignatureField>) {
        (
            self.text_fields.iter().filter(|f| f.page == page).collect(),
            self.signature_fields
                .iter()
                .filter(|f| f.page == page)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.text_fields.is_empty() && self.signature_fields.is_empty()
    }

    // ------------------------------------------------------------------
    // Text fields
    // ------------------------------------------------------------------

    /// Add a field of `field_type` on the current page and make it active.
    pub fn add_text_field(
        &mut self,
        field_type: FieldType,
        view: &PageView,
        seed: &FieldSeed<'_>,
    ) -> Result<&TextField, FirmaError> {
        if !view.is_loaded() {
            return Err(FirmaError::NoDocument);
        }

        let seeded = seed_for(field_type, seed);
        let field = TextField {
            id: uuid::Uuid::new_v4().to_string(),
            text: seeded.text,
            x: NEW_FIELD_ANCHOR.0,
            y: NEW_FIELD_ANCHOR.1,
            width: seeded.width,
            height: seeded.height,
            is_new: true,
            font_family: seed.defaults.font_family.clone(),
            font_size: seeded.font_size,
            color: NEW_FIELD_COLOR.to_string(),
            is_bold: false,
            is_italic: false,
            is_underline: false,
            is_strikethrough: false,
            page: view.current_page.max(1),
            field_type,
        };

        tracing::debug!(id = %field.id, kind = field_type.name(), page = field.page, "Field added");
        self.active_field_id = Some(field.id.clone());
        self.text_fields.push(field);
        Ok(&self.text_fields[self.text_fields.len() - 1])
    }

    pub fn remove_text_field(&mut self, id: &str) -> bool {
        let before = self.text_fields.len();
        self.text_fields.retain(|f| f.id != id);
        self.clear_active_if(id);
        self.text_fields.len() != before
    }

    pub fn update_text(&mut self, id: &str, text: impl Into<String>) -> Result<(), FirmaError> {
        self.update_property(id, FieldPatch::Text(text.into()))
    }

    pub fn update_property(&mut self, id: &str, patch: FieldPatch) -> Result<(), FirmaError> {
        let field = self.text_field_mut(id)?;
        patch.apply(field);
        field.is_new = false;
        Ok(())
    }

    /// Move a field to an on-screen position. Returns `Ok(false)` when the page
    /// has not finished loading and nothing was changed.
    pub fn update_position(
        &mut self,
        id: &str,
        position: ScreenPoint,
        view: &PageView,
    ) -> Result<bool, FirmaError> {
        let Some(anchor) = normalize(position, view.scaled_size()) else {
            return Ok(false);
        };
        let field = self.text_field_mut(id)?;
        field.x = anchor.x;
        field.y = anchor.y;
        field.is_new = false;
        Ok(true)
    }

    pub fn update_dimensions(&mut self, id: &str, size: Size) -> Result<(), FirmaError> {
        let field = self.text_field_mut(id)?;
        field.width = size.width;
        field.height = size.height;
        field.is_new = false;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Signature placements
    // ------------------------------------------------------------------

    /// Place a signature from the library on the current page.
    ///
    /// The field starts with a provisional 150×75 box; call
    /// [`complete_signature_measurement`](Self::complete_signature_measurement)
    /// once the image size is known.
    pub fn place_signature(
        &mut self,
        signature_id: &str,
        library: &SignatureLibrary,
        view: &PageView,
    ) -> Result<&SignatureField, FirmaError> {
        if !view.is_loaded() {
            return Err(FirmaError::NoDocument);
        }
        let signature = library
            .get(signature_id)
            .ok_or_else(|| FirmaError::SignatureNotFound(signature_id.to_string()))?;

        let field = SignatureField {
            id: uuid::Uuid::new_v4().to_string(),
            signature_id: signature.id.clone(),
            data_url: signature.data_url.clone(),
            x: NEW_FIELD_ANCHOR.0,
            y: NEW_FIELD_ANCHOR.1,
            width: SIGNATURE_WIDTH,
            height: SIGNATURE_HEIGHT,
            page: view.current_page.max(1),
            is_new: true,
        };

        self.active_field_id = Some(field.id.clone());
        self.signature_fields.push(field);
        Ok(&self.signature_fields[self.signature_fields.len() - 1])
    }

    /// Patch a placed signature's height so the box matches the image aspect ratio.
    ///
    /// Returns `false` when the field no longer exists or the image has no size.
    pub fn complete_signature_measurement(
        &mut self,
        id: &str,
        image_width: u32,
        image_height: u32,
    ) -> bool {
        if image_width == 0 || image_height == 0 {
            return false;
        }
        let Some(field) = self.signature_fields.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        let aspect = image_width as f64 / image_height as f64;
        field.height = field.width / aspect;
        true
    }

    pub fn remove_signature_field(&mut self, id: &str) -> bool {
        let before = self.signature_fields.len();
        self.signature_fields.retain(|f| f.id != id);
        self.clear_active_if(id);
        self.signature_fields.len() != before
    }

    pub fn update_signature_position(
        &mut self,
        id: &str,
        position: ScreenPoint,
        view: &PageView,
    ) -> Result<bool, FirmaError> {
        let Some(anchor) = normalize(position, view.scaled_size()) else {
            return Ok(false);
        };
        let field = self.signature_field_mut(id)?;
        field.x = anchor.x;
        field.y = anchor.y;
        field.is_new = false;
        Ok(true)
    }

    pub fn update_signature_dimensions(&mut self, id: &str, size: Size) -> Result<(), FirmaError> {
        let field = self.signature_field_mut(id)?;
        field.width = size.width;
        field.height = size.height;
        field.is_new = false;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Whole-store operations
    // ------------------------------------------------------------------

    pub fn deselect_all(&mut self) {
        self.active_field_id = None;
        for field in &mut self.text_fields {
            field.is_new = false;
        }
        for field in &mut self.signature_fields {
            field.is_new = false;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self, hash: &str, file_name: &str, now_millis: i64) -> DocumentState {
        DocumentState {
            hash: hash.to_string(),
            text_fields: self.text_fields.clone(),
            signature_fields: self.signature_fields.clone(),
            last_modified: now_millis,
            file_name: file_name.to_string(),
        }
    }

    pub fn restore(state: DocumentState) -> Self {
        Self {
            text_fields: state.text_fields,
            signature_fields: state.signature_fields,
            active_field_id: None,
        }
    }

    fn clear_active_if(&mut self, id: &str) {
        if self.active_field_id.as_deref() == Some(id) {
            self.active_field_id = None;
        }
    }

    fn text_field_mut(&mut self, id: &str) -> Result<&mut TextField, FirmaError> {
        self.text_fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| FirmaError::FieldNotFound(id.to_string()))
    }

    fn signature_field_mut(&mut self, id: &str) -> Result<&mut SignatureField, FirmaError> {
        self.signature_fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| FirmaError::FieldNotFound(id.to_string()))
    }
}
