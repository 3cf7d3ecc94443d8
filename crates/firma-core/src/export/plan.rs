//! Field grouping and the content operators each field turns into.

use std::collections::BTreeMap;

use firma_types::{SignatureField, TextField};
use lopdf::content::Operation;
use lopdf::Object;

/// Everything drawn on one page, texts before signatures.
#[derive(Debug, Default)]
pub(crate) struct PagePlan<'a> {
    pub texts: Vec<&'a TextField>,
    pub signatures: Vec<&'a SignatureField>,
}

/// Group drawable fields by page, in ascending page order. Text fields with
/// only whitespace are dropped.
pub(crate) fn plan_pages<'a>(
    text_fields: &'a [TextField],
    signature_fields: &'a [SignatureField],
) -> BTreeMap<u32, PagePlan<'a>> {
    let mut pages: BTreeMap<u32, PagePlan<'a>> = BTreeMap::new();
    for field in text_fields.iter().filter(|f| f.has_visible_text()) {
        pages.entry(field.page).or_default().texts.push(field);
    }
    for field in signature_fields {
        pages.entry(field.page).or_default().signatures.push(field);
    }
    pages
}

/// Parse `#RRGGBB` (the `#` is optional) to RGB floats in 0..=1.
/// Anything else is black.
pub(crate) fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return (0.0, 0.0, 0.0);
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f32 / 255.0
    };
    (channel(0..2), channel(2..4), channel(4..6))
}

/// Line breaks cannot be shown by a single `Tj`; draw them as spaces.
pub(crate) fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rgb(color: (f32, f32, f32)) -> Vec<Object> {
    vec![
        Object::Real(color.0),
        Object::Real(color.1),
        Object::Real(color.2),
    ]
}

/// `q BT /F size Tf r g b rg x y Td <text> Tj ET Q`
pub(crate) fn text_ops(
    font_name: &str,
    font_size: f64,
    color: (f32, f32, f32),
    origin: (f64, f64),
    operand: Object,
) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_name.as_bytes().to_vec()), real(font_size)],
        ),
        Operation::new("rg", rgb(color)),
        Operation::new("Td", vec![real(origin.0), real(origin.1)]),
        Operation::new("Tj", vec![operand]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// A stroked horizontal line from `start` spanning `width`.
pub(crate) fn line_ops(
    start: (f64, f64),
    width: f64,
    thickness: f64,
    color: (f32, f32, f32),
) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("RG", rgb(color)),
        Operation::new("w", vec![real(thickness)]),
        Operation::new("m", vec![real(start.0), real(start.1)]),
        Operation::new("l", vec![real(start.0 + width), real(start.1)]),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// `q w 0 0 h x y cm /Im Do Q`
pub(crate) fn image_ops(image_name: &str, origin: (f64, f64), size: (f64, f64)) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(size.0),
                real(0.0),
                real(0.0),
                real(size.1),
                real(origin.0),
                real(origin.1),
            ],
        ),
        Operation::new("Do", vec![Object::Name(image_name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}
