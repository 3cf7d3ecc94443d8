//! In-memory documents and field builders

#![allow(dead_code)]

use firma_core::data_url::DataUrl;
use firma_types::{FieldType, SignatureField, TextField};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Marker drawn by every test page so the original content can be found again
pub const ORIGINAL_CONTENT: &[u8] = b"0 0 10 10 re f\n";

/// Build a document with one page per media box (`[llx lly urx ury]`).
/// Each page carries a little content and its own `/F1` font resource.
pub fn create_test_pdf(media_boxes: &[[i64; 4]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for media_box in media_boxes {
        let content_id = doc.add_object(Stream::new(dictionary! {}, ORIGINAL_CONTENT.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<Object>>(),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn letter_pdf(pages: usize) -> Vec<u8> {
    create_test_pdf(&vec![[0, 0, 612, 792]; pages])
}

pub fn text_field(text: &str, x: f64, y: f64, page: u32) -> TextField {
    TextField {
        id: format!("field-{}-{}", page, text),
        text: text.to_string(),
        x,
        y,
        width: 120.0,
        height: 40.0,
        is_new: false,
        font_family: "Inter".to_string(),
        font_size: 12.0,
        color: "#000000".to_string(),
        is_bold: false,
        is_italic: false,
        is_underline: false,
        is_strikethrough: false,
        page,
        field_type: FieldType::Text,
    }
}

pub fn signature_field(data_url: String, x: f64, y: f64, page: u32) -> SignatureField {
    SignatureField {
        id: format!("sig-{}", page),
        signature_id: "library-entry".to_string(),
        data_url,
        x,
        y,
        width: 150.0,
        height: 50.0,
        page,
        is_new: false,
    }
}

pub fn png_data_url(width: u32, height: u32) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    DataUrl::encode("image/png", &bytes)
}

pub fn jpeg_data_url(width: u32, height: u32) -> String {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    DataUrl::encode("image/jpeg", &bytes)
}

/// Decoded content operations of `page` (1-based)
pub fn page_ops(pdf: &[u8], page: u32) -> Vec<Operation> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

pub fn ops_named<'a>(ops: &'a [Operation], operator: &str) -> Vec<&'a Operation> {
    ops.iter().filter(|op| op.operator == operator).collect()
}

pub fn num(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {:?}", other),
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {}, got {}",
        expected,
        actual
    );
}
