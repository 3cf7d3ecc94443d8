//! A tiny TrueType program: printable ASCII only, every glyph 600 units wide.

#![allow(dead_code)]

use async_trait::async_trait;
use firma_core::FontSource;

/// Glyph id of `'H'` in [`minimal_truetype`]
pub const GLYPH_H: u16 = 41;
pub const ADVANCE: i64 = 600;

fn table(tag: &[u8; 4], data: Vec<u8>) -> ([u8; 4], Vec<u8>) {
    (*tag, data)
}

fn head() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    t.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    t.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    t.extend_from_slice(&0u16.to_be_bytes()); // flags
    t.extend_from_slice(&1000u16.to_be_bytes()); // unitsPerEm
    t.extend_from_slice(&[0u8; 16]); // created, modified
    for v in [0i16, -200, 600, 800] {
        t.extend_from_slice(&v.to_be_bytes());
    }
    t.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    t.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    t.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    t.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat
    t.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    assert_eq!(t.len(), 54);
    t
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    t.extend_from_slice(&800i16.to_be_bytes()); // ascender
    t.extend_from_slice(&(-200i16).to_be_bytes()); // descender
    t.extend_from_slice(&0i16.to_be_bytes()); // lineGap
    t.extend_from_slice(&600u16.to_be_bytes()); // advanceWidthMax
    t.extend_from_slice(&[0u8; 22]);
    t.extend_from_slice(&1u16.to_be_bytes()); // numberOfHMetrics
    assert_eq!(t.len(), 36);
    t
}

fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    t.extend_from_slice(&num_glyphs.to_be_bytes());
    t
}

fn hmtx(num_glyphs: u16) -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&(ADVANCE as u16).to_be_bytes());
    t.extend_from_slice(&0i16.to_be_bytes());
    for _ in 1..num_glyphs {
        t.extend_from_slice(&0i16.to_be_bytes());
    }
    t
}

/// Format 4 subtable mapping U+0020..=U+007E to glyphs 1..=95.
fn cmap() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0u16.to_be_bytes()); // version
    t.extend_from_slice(&1u16.to_be_bytes()); // numTables
    t.extend_from_slice(&3u16.to_be_bytes()); // Windows
    t.extend_from_slice(&1u16.to_be_bytes()); // Unicode BMP
    t.extend_from_slice(&12u32.to_be_bytes());

    t.extend_from_slice(&4u16.to_be_bytes()); // format
    t.extend_from_slice(&32u16.to_be_bytes()); // length
    t.extend_from_slice(&0u16.to_be_bytes()); // language
    t.extend_from_slice(&4u16.to_be_bytes()); // segCountX2
    t.extend_from_slice(&4u16.to_be_bytes()); // searchRange
    t.extend_from_slice(&1u16.to_be_bytes()); // entrySelector
    t.extend_from_slice(&0u16.to_be_bytes()); // rangeShift
    for end in [0x007Eu16, 0xFFFF] {
        t.extend_from_slice(&end.to_be_bytes());
    }
    t.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for start in [0x0020u16, 0xFFFF] {
        t.extend_from_slice(&start.to_be_bytes());
    }
    for delta in [-31i16, 1] {
        t.extend_from_slice(&delta.to_be_bytes());
    }
    for range_offset in [0u16, 0] {
        t.extend_from_slice(&range_offset.to_be_bytes());
    }
    t
}

pub fn minimal_truetype() -> Vec<u8> {
    let num_glyphs = 96;
    // Records must be sorted by tag
    let tables = [
        table(b"cmap", cmap()),
        table(b"head", head()),
        table(b"hhea", hhea()),
        table(b"hmtx", hmtx(num_glyphs)),
        table(b"maxp", maxp(num_glyphs)),
    ];

    let mut font = Vec::new();
    font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    font.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    font.extend_from_slice(&64u16.to_be_bytes()); // searchRange
    font.extend_from_slice(&2u16.to_be_bytes()); // entrySelector
    font.extend_from_slice(&16u16.to_be_bytes()); // rangeShift

    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in &tables {
        font.extend_from_slice(tag);
        font.extend_from_slice(&0u32.to_be_bytes());
        font.extend_from_slice(&(offset as u32).to_be_bytes());
        font.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in &tables {
        font.extend_from_slice(data);
        font.resize((font.len() + 3) & !3, 0);
    }
    font
}

/// Serves [`minimal_truetype`] for every request.
pub struct FixedFontSource;

#[async_trait]
impl FontSource for FixedFontSource {
    async fn resolve_font_bytes(&self, _family: &str, _bold: bool, _italic: bool) -> Option<Vec<u8>> {
        Some(minimal_truetype())
    }
}

/// A source whose every fetch fails.
pub struct UnreachableFontSource;

#[async_trait]
impl FontSource for UnreachableFontSource {
    async fn resolve_font_bytes(&self, _family: &str, _bold: bool, _italic: bool) -> Option<Vec<u8>> {
        None
    }
}
