//! Font resolution for exported text
//!
//! A [`FontSource`] turns a `(family, bold, italic)` request into raw font
//! program bytes. The export pipeline parses what comes back into a
//! [`FontProgram`] and embeds it; anything that cannot be fetched or decoded
//! falls back to the built-in Helvetica face.

pub mod css;
mod embed;
mod program;
mod remote;
mod standard;

pub use embed::{FontBook, FontHandle, FontStats, LaidOutText};
pub use program::{FontMetrics, FontProgram, Glyph, OutlineKind};
pub use remote::{FontSourceConfig, HttpFontSource};
pub use standard::{helvetica_width, win_ansi_byte};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cache key for resolved fonts within a single export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: impl Into<String>, bold: bool, italic: bool) -> Self {
        Self {
            family: family.into(),
            bold,
            italic,
        }
    }

    pub fn weight(&self) -> u16 {
        if self.bold {
            700
        } else {
            400
        }
    }
}

impl std::fmt::Display for FontKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let style = match (self.bold, self.italic) {
            (false, false) => "regular",
            (true, false) => "bold",
            (false, true) => "italic",
            (true, true) => "bold italic",
        };
        write!(f, "{} {}", self.family, style)
    }
}

/// Where font program bytes come from.
///
/// Implementations never fail: a source that cannot produce bytes returns
/// `None` and the caller uses the standard font.
#[async_trait]
pub trait FontSource: Send + Sync {
    async fn resolve_font_bytes(&self, family: &str, bold: bool, italic: bool) -> Option<Vec<u8>>;
}

/// Never resolves anything; every field is drawn with Helvetica.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFontSource;

#[async_trait]
impl FontSource for OfflineFontSource {
    async fn resolve_font_bytes(&self, _family: &str, _bold: bool, _italic: bool) -> Option<Vec<u8>> {
        None
    }
}
