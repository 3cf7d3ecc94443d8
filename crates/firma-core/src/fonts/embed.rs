//! Per-export font registry: resolves each key once, lays out text and writes
//! the font objects into the document.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::Serialize;

use super::program::{FontProgram, OutlineKind};
use super::standard::{encode_win_ansi, measure_win_ansi};
use super::{FontKey, FontSource};
use crate::error::FirmaError;

/// Index of a loaded font within its [`FontBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(usize);

/// How many font keys were embedded versus drawn with Helvetica.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FontStats {
    pub embedded: usize,
    pub fallback: usize,
}

/// Text ready for a `Tj` operator, with its advance width in user space.
#[derive(Debug, Clone)]
pub struct LaidOutText {
    pub operand: Object,
    pub width: f64,
}

enum LoadedFace {
    Embedded {
        program: FontProgram,
        base_name: String,
        /// glyph id -> (character, advance in font units)
        used: BTreeMap<u16, (char, u16)>,
    },
    Standard,
}

struct Slot {
    resource_name: String,
    object_id: ObjectId,
    face: LoadedFace,
}

pub struct FontBook<'s> {
    source: &'s dyn FontSource,
    slots: Vec<Slot>,
    by_key: HashMap<FontKey, FontHandle>,
    helvetica: Option<FontHandle>,
    stats: FontStats,
}

impl<'s> FontBook<'s> {
    pub fn new(source: &'s dyn FontSource) -> Self {
        Self {
            source,
            slots: Vec::new(),
            by_key: HashMap::new(),
            helvetica: None,
            stats: FontStats::default(),
        }
    }

    /// Resolve `key`, consulting the font source at most once per key.
    pub async fn load(&mut self, doc: &mut Document, key: &FontKey) -> FontHandle {
        if let Some(handle) = self.by_key.get(key) {
            return *handle;
        }

        let resolved = self
            .source
            .resolve_font_bytes(&key.family, key.bold, key.italic)
            .await;
        let handle = match resolved {
            Some(bytes) => match FontProgram::parse(bytes) {
                Ok(program) => {
                    tracing::debug!(font = %key, kind = ?program.kind(), "Embedding font");
                    self.stats.embedded += 1;
                    self.push_embedded(doc, key, program)
                }
                Err(e) => {
                    tracing::warn!(font = %key, error = %e, "Font program unusable, using Helvetica");
                    self.stats.fallback += 1;
                    self.helvetica(doc)
                }
            },
            None => {
                tracing::warn!(font = %key, "Font unavailable, using Helvetica");
                self.stats.fallback += 1;
                self.helvetica(doc)
            }
        };

        self.by_key.insert(key.clone(), handle);
        handle
    }

    fn push_embedded(&mut self, doc: &mut Document, key: &FontKey, program: FontProgram) -> FontHandle {
        let base_name = program
            .metrics()
            .post_script_name
            .clone()
            .map(|name| pdf_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_base_name(key));
        let handle = FontHandle(self.slots.len());
        self.slots.push(Slot {
            resource_name: format!("FirmaF{}", handle.0),
            // Written by `finish` once the used glyphs are known
            object_id: doc.new_object_id(),
            face: LoadedFace::Embedded {
                program,
                base_name,
                used: BTreeMap::new(),
            },
        });
        handle
    }

    fn helvetica(&mut self, doc: &mut Document) -> FontHandle {
        if let Some(handle) = self.helvetica {
            return handle;
        }
        let object_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let handle = FontHandle(self.slots.len());
        self.slots.push(Slot {
            resource_name: format!("FirmaF{}", handle.0),
            object_id,
            face: LoadedFace::Standard,
        });
        self.helvetica = Some(handle);
        handle
    }

    /// Resource name and font dictionary id for a page's `/Font` entry.
    pub fn resource(&self, handle: FontHandle) -> (&str, ObjectId) {
        let slot = &self.slots[handle.0];
        (&slot.resource_name, slot.object_id)
    }

    pub fn stats(&self) -> FontStats {
        self.stats
    }

    /// Encode `text` for `Tj` and measure it at `font_size`. Glyphs used by
    /// embedded fonts are recorded for their width and ToUnicode tables.
    pub fn lay_out(
        &mut self,
        handle: FontHandle,
        text: &str,
        font_size: f64,
    ) -> Result<LaidOutText, FirmaError> {
        match &mut self.slots[handle.0].face {
            LoadedFace::Standard => {
                let encoded = encode_win_ansi(text);
                let width = measure_win_ansi(&encoded, font_size);
                Ok(LaidOutText {
                    operand: Object::String(encoded, StringFormat::Literal),
                    width,
                })
            }
            LoadedFace::Embedded { program, used, .. } => {
                let glyphs = program.glyphs(text)?;
                let upem = program.metrics().units_per_em.max(1) as f64;
                let mut bytes = Vec::with_capacity(glyphs.len() * 2);
                let mut units = 0u32;
                for glyph in glyphs {
                    bytes.extend_from_slice(&glyph.id.to_be_bytes());
                    units += glyph.advance as u32;
                    if glyph.id != 0 {
                        used.entry(glyph.id).or_insert((glyph.ch, glyph.advance));
                    }
                }
                Ok(LaidOutText {
                    operand: Object::String(bytes, StringFormat::Hexadecimal),
                    width: units as f64 * font_size / upem,
                })
            }
        }
    }

    /// Write the Type0 font objects of every embedded font.
    pub fn finish(self, doc: &mut Document) -> Result<FontStats, FirmaError> {
        for slot in self.slots {
            if let LoadedFace::Embedded {
                program,
                base_name,
                used,
            } = slot.face
            {
                write_type0_font(doc, slot.object_id, &program, &base_name, &used)?;
            }
        }
        Ok(self.stats)
    }
}

fn write_type0_font(
    doc: &mut Document,
    font_id: ObjectId,
    program: &FontProgram,
    base_name: &str,
    used: &BTreeMap<u16, (char, u16)>,
) -> Result<(), FirmaError> {
    let metrics = program.metrics();

    let mut file_dict = dictionary! { "Filter" => "FlateDecode" };
    match program.kind() {
        OutlineKind::TrueType => file_dict.set("Length1", program.data().len() as i64),
        OutlineKind::Cff => file_dict.set("Subtype", "OpenType"),
    }
    let file_id = doc.add_object(Stream::new(file_dict, deflate(program.data())?));

    let mut flags: i64 = 32;
    if metrics.is_fixed_pitch {
        flags |= 1;
    }
    if metrics.italic_angle != 0.0 {
        flags |= 64;
    }
    let scale = |v: i16| Object::Integer(program.to_pdf_units(v as i32));
    let file_key = match program.kind() {
        OutlineKind::TrueType => "FontFile2",
        OutlineKind::Cff => "FontFile3",
    };
    let mut descriptor = dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(base_name.as_bytes().to_vec()),
        "Flags" => flags,
        "FontBBox" => metrics.bbox.iter().map(|v| scale(*v)).collect::<Vec<Object>>(),
        "ItalicAngle" => Object::Real(metrics.italic_angle),
        "Ascent" => scale(metrics.ascent),
        "Descent" => scale(metrics.descent),
        "CapHeight" => scale(metrics.cap_height),
        "StemV" => 80,
    };
    descriptor.set(file_key, Object::Reference(file_id));
    let descriptor_id = doc.add_object(descriptor);

    let mut widths = Vec::with_capacity(used.len() * 2);
    for (gid, (_, advance)) in used {
        widths.push(Object::Integer(*gid as i64));
        widths.push(Object::Array(vec![Object::Integer(
            program.to_pdf_units(*advance as i32),
        )]));
    }

    let subtype = match program.kind() {
        OutlineKind::TrueType => "CIDFontType2",
        OutlineKind::Cff => "CIDFontType0",
    };
    let mut cid_font = dictionary! {
        "Type" => "Font",
        "Subtype" => subtype,
        "BaseFont" => Object::Name(base_name.as_bytes().to_vec()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => Object::Reference(descriptor_id),
        "W" => widths,
    };
    if program.kind() == OutlineKind::TrueType {
        cid_font.set("CIDToGIDMap", "Identity");
    }
    let cid_font_id = doc.add_object(cid_font);

    let to_unicode_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(used).into_bytes(),
    ));

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(base_name.as_bytes().to_vec()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => Object::Reference(to_unicode_id),
        }),
    );
    Ok(())
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, FirmaError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn to_unicode_cmap(used: &BTreeMap<u16, (char, u16)>) -> String {
    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n");
    out.push_str("12 dict begin\n");
    out.push_str("begincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n");
    out.push_str("/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let entries: Vec<(&u16, &(char, u16))> = used.iter().collect();
    // bfchar sections hold at most 100 entries
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, (ch, _)) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\n");
    out.push_str("CMapName currentdict /CMap defineresource pop\n");
    out.push_str("end\nend\n");
    out
}

/// Keep only characters that are legal in a PDF name without escaping.
fn pdf_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

fn fallback_base_name(key: &FontKey) -> String {
    let style = match (key.bold, key.italic) {
        (false, false) => "Regular",
        (true, false) => "Bold",
        (false, true) => "Italic",
        (true, true) => "BoldItalic",
    };
    format!("{}-{}", pdf_name(&key.family), style)
}
