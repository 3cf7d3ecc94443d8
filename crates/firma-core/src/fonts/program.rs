//! Font program decoding and metrics.

use std::io::Read;

use flate2::read::ZlibDecoder;
use ttf_parser::{name_id, Face, GlyphId};

use crate::error::FirmaError;

const WOFF_HEADER_LEN: usize = 44;
const WOFF_ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;

/// Outline format of an sfnt program; decides the descendant font subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    /// `glyf` outlines (`CIDFontType2` / `FontFile2`)
    TrueType,
    /// `CFF ` outlines (`CIDFontType0` / `FontFile3 /OpenType`)
    Cff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    /// xMin, yMin, xMax, yMax
    pub bbox: [i16; 4],
    pub italic_angle: f32,
    pub is_fixed_pitch: bool,
    pub post_script_name: Option<String>,
}

/// One character mapped to a glyph of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    /// 0 (`.notdef`) when the font has no glyph for `ch`
    pub id: u16,
    pub advance: u16,
}

/// A parsed, embeddable sfnt font program.
#[derive(Debug, Clone)]
pub struct FontProgram {
    data: Vec<u8>,
    kind: OutlineKind,
    metrics: FontMetrics,
}

enum Container {
    Sfnt(OutlineKind),
    Woff,
    Woff2,
    Collection,
    Unknown,
}

fn sniff(bytes: &[u8]) -> Container {
    match bytes.get(0..4) {
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"true") => Container::Sfnt(OutlineKind::TrueType),
        Some(b"OTTO") => Container::Sfnt(OutlineKind::Cff),
        Some(b"wOFF") => Container::Woff,
        Some(b"wOF2") => Container::Woff2,
        Some(b"ttcf") => Container::Collection,
        _ => Container::Unknown,
    }
}

impl FontProgram {
    /// Accepts raw TrueType/OpenType or WOFF 1.0. WOFF2, collections and
    /// variable fonts are rejected.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, FirmaError> {
        let (data, kind) = match sniff(&bytes) {
            Container::Sfnt(kind) => (bytes, kind),
            Container::Woff => {
                let sfnt = decode_woff(&bytes)?;
                match sniff(&sfnt) {
                    Container::Sfnt(kind) => (sfnt, kind),
                    _ => return Err(FirmaError::FontError("unknown WOFF flavor".to_string())),
                }
            }
            Container::Woff2 => {
                return Err(FirmaError::FontError("WOFF2 programs are not supported".to_string()))
            }
            Container::Collection => {
                return Err(FirmaError::FontError("font collections are not supported".to_string()))
            }
            Container::Unknown => {
                return Err(FirmaError::FontError("unrecognized font program".to_string()))
            }
        };

        let metrics = {
            let face = Face::parse(&data, 0).map_err(|e| FirmaError::FontError(e.to_string()))?;
            if face.is_variable() {
                return Err(FirmaError::FontError("variable fonts are not supported".to_string()));
            }
            read_metrics(&face)
        };

        Ok(Self {
            data,
            kind,
            metrics,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The sfnt bytes; WOFF input comes back unwrapped.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn kind(&self) -> OutlineKind {
        self.kind
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Map each character of `text` to its glyph and advance width.
    pub fn glyphs(&self, text: &str) -> Result<Vec<Glyph>, FirmaError> {
        let face = Face::parse(&self.data, 0).map_err(|e| FirmaError::FontError(e.to_string()))?;
        Ok(text
            .chars()
            .map(|ch| {
                let id = face.glyph_index(ch).unwrap_or(GlyphId(0));
                Glyph {
                    ch,
                    id: id.0,
                    advance: face.glyph_hor_advance(id).unwrap_or(0),
                }
            })
            .collect())
    }

    /// Convert font units to thousandths of text space, as PDF widths expect.
    pub fn to_pdf_units(&self, value: i32) -> i64 {
        let upem = self.metrics.units_per_em.max(1) as f64;
        (value as f64 * 1000.0 / upem).round() as i64
    }
}

fn read_metrics(face: &Face<'_>) -> FontMetrics {
    let bbox = face.global_bounding_box();
    let post_script_name = face
        .names()
        .into_iter()
        .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME && name.is_unicode())
        .find_map(|name| name.to_string());

    FontMetrics {
        units_per_em: face.units_per_em(),
        ascent: face.ascender(),
        descent: face.descender(),
        cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
        bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
        italic_angle: if face.is_italic() { -12.0 } else { 0.0 },
        is_fixed_pitch: face.is_monospaced(),
        post_script_name,
    }
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, FirmaError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| FirmaError::FontError("truncated WOFF data".to_string()))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, FirmaError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| FirmaError::FontError("truncated WOFF data".to_string()))
}

struct WoffTable<'a> {
    tag: u32,
    checksum: u32,
    data: std::borrow::Cow<'a, [u8]>,
}

/// Rebuild the sfnt wrapped by a WOFF 1.0 container.
pub(crate) fn decode_woff(woff: &[u8]) -> Result<Vec<u8>, FirmaError> {
    if woff.len() < WOFF_HEADER_LEN {
        return Err(FirmaError::FontError("truncated WOFF header".to_string()));
    }
    let flavor = read_u32(woff, 4)?;
    let num_tables = read_u16(woff, 12)? as usize;

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let entry = WOFF_HEADER_LEN + i * WOFF_ENTRY_LEN;
        let tag = read_u32(woff, entry)?;
        let offset = read_u32(woff, entry + 4)? as usize;
        let comp_length = read_u32(woff, entry + 8)? as usize;
        let orig_length = read_u32(woff, entry + 12)? as usize;
        let checksum = read_u32(woff, entry + 16)?;

        let raw = woff
            .get(offset..offset + comp_length)
            .ok_or_else(|| FirmaError::FontError("WOFF table out of bounds".to_string()))?;
        let data = if comp_length < orig_length {
            let mut out = Vec::with_capacity(orig_length);
            ZlibDecoder::new(raw)
                .read_to_end(&mut out)
                .map_err(|e| FirmaError::FontError(format!("WOFF inflate failed: {}", e)))?;
            if out.len() != orig_length {
                return Err(FirmaError::FontError("WOFF table length mismatch".to_string()));
            }
            std::borrow::Cow::Owned(out)
        } else {
            std::borrow::Cow::Borrowed(raw)
        };
        tables.push(WoffTable {
            tag,
            checksum,
            data,
        });
    }

    let mut pow2 = 1usize;
    let mut entry_selector = 0u16;
    while pow2 * 2 <= num_tables {
        pow2 *= 2;
        entry_selector += 1;
    }
    let search_range = (pow2 * 16) as u16;
    let range_shift = (num_tables * 16) as u16 - search_range.min((num_tables * 16) as u16);

    let mut sfnt = Vec::new();
    sfnt.extend_from_slice(&flavor.to_be_bytes());
    sfnt.extend_from_slice(&(num_tables as u16).to_be_bytes());
    sfnt.extend_from_slice(&search_range.to_be_bytes());
    sfnt.extend_from_slice(&entry_selector.to_be_bytes());
    sfnt.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = SFNT_HEADER_LEN + num_tables * SFNT_RECORD_LEN;
    for table in &tables {
        sfnt.extend_from_slice(&table.tag.to_be_bytes());
        sfnt.extend_from_slice(&table.checksum.to_be_bytes());
        sfnt.extend_from_slice(&(offset as u32).to_be_bytes());
        sfnt.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        offset += padded(table.data.len());
    }
    for table in &tables {
        sfnt.extend_from_slice(&table.data);
        sfnt.resize(sfnt.len() + padded(table.data.len()) - table.data.len(), 0);
    }
    Ok(sfnt)
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Two-table sfnt laid out the way `decode_woff` rebuilds one.
    fn sample_sfnt() -> (Vec<u8>, Vec<(u32, u32, Vec<u8>)>) {
        let tables = vec![
            (u32::from_be_bytes(*b"cmap"), 0x1111_2222u32, vec![7u8; 300]),
            (u32::from_be_bytes(*b"head"), 0x3333_4444, vec![1, 2, 3, 4, 5]),
        ];
        let mut sfnt = Vec::new();
        sfnt.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        sfnt.extend_from_slice(&2u16.to_be_bytes());
        sfnt.extend_from_slice(&32u16.to_be_bytes()); // searchRange
        sfnt.extend_from_slice(&1u16.to_be_bytes()); // entrySelector
        sfnt.extend_from_slice(&0u16.to_be_bytes()); // rangeShift
        let mut offset = 12 + 2 * 16;
        for (tag, checksum, data) in &tables {
            sfnt.extend_from_slice(&tag.to_be_bytes());
            sfnt.extend_from_slice(&checksum.to_be_bytes());
            sfnt.extend_from_slice(&(offset as u32).to_be_bytes());
            sfnt.extend_from_slice(&(data.len() as u32).to_be_bytes());
            offset += padded(data.len());
        }
        for (_, _, data) in &tables {
            sfnt.extend_from_slice(data);
            sfnt.resize(sfnt.len() + padded(data.len()) - data.len(), 0);
        }
        (sfnt, tables)
    }

    fn to_woff(tables: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
        let mut entries = Vec::new();
        let mut bodies = Vec::new();
        let mut offset = WOFF_HEADER_LEN + tables.len() * WOFF_ENTRY_LEN;
        for (tag, checksum, data) in tables {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            let compressed = encoder.finish().unwrap();
            // Tables that do not shrink are stored raw
            let body = if compressed.len() < data.len() {
                compressed
            } else {
                data.clone()
            };
            entries.extend_from_slice(&tag.to_be_bytes());
            entries.extend_from_slice(&(offset as u32).to_be_bytes());
            entries.extend_from_slice(&(body.len() as u32).to_be_bytes());
            entries.extend_from_slice(&(data.len() as u32).to_be_bytes());
            entries.extend_from_slice(&checksum.to_be_bytes());
            offset += padded(body.len());
            let pad = padded(body.len()) - body.len();
            bodies.extend_from_slice(&body);
            bodies.extend(std::iter::repeat(0u8).take(pad));
        }

        let mut woff = Vec::new();
        woff.extend_from_slice(b"wOFF");
        woff.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        woff.extend_from_slice(&((offset) as u32).to_be_bytes());
        woff.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        woff.extend_from_slice(&0u16.to_be_bytes());
        woff.extend_from_slice(&[0u8; 24]); // sfnt size, version, metadata, private
        woff.extend_from_slice(&entries);
        woff.extend_from_slice(&bodies);
        woff
    }

    #[test]
    fn test_woff_decodes_to_original_sfnt() {
        let (sfnt, tables) = sample_sfnt();
        let woff = to_woff(&tables);
        assert_eq!(decode_woff(&woff).unwrap(), sfnt);
    }

    #[test]
    fn test_truncated_woff_is_an_error() {
        let (_, tables) = sample_sfnt();
        let woff = to_woff(&tables);
        assert!(decode_woff(&woff[..60]).is_err());
    }

    #[test]
    fn test_rejects_woff2_and_unknown() {
        let err = FontProgram::parse(b"wOF2\0\0\0\0".to_vec()).unwrap_err();
        assert!(err.to_string().contains("WOFF2"));
        assert!(FontProgram::parse(b"<html>".to_vec()).is_err());
        assert!(FontProgram::parse(Vec::new()).is_err());
    }
}
