//! Page surgery: media boxes, page-local resources, content wrapping and
//! image XObjects.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::coords::MediaBox;
use crate::data_url::{read_jpeg_header, DataUrl};
use crate::error::FirmaError;

/// Used when neither the page nor any ancestor declares a media box.
const DEFAULT_MEDIA_BOX: MediaBox = MediaBox {
    x: 0.0,
    y: 0.0,
    width: 612.0,
    height: 792.0,
};

fn as_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn parse_media_box(doc: &Document, obj: &Object) -> Option<MediaBox> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let nums: Vec<f64> = arr
        .iter()
        .map(|o| resolve(doc, o).and_then(as_f64))
        .collect::<Option<Vec<f64>>>()?;
    Some(MediaBox::from_corners(nums[0], nums[1], nums[2], nums[3]))
}

/// The page's media box, inherited through `/Parent` when the page has none.
pub(crate) fn page_media_box(doc: &Document, page_id: ObjectId) -> MediaBox {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_object(id).and_then(|o| o.as_dict()) else {
            break;
        };
        if let Some(media_box) = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| parse_media_box(doc, obj))
        {
            return media_box;
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    tracing::warn!(?page_id, "Page has no MediaBox, assuming US Letter");
    DEFAULT_MEDIA_BOX
}

fn owned_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    resolve(doc, obj)?.as_dict().ok().cloned()
}

/// Resources that apply to the page: its own, else the nearest ancestor's.
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_object(id).and_then(|o| o.as_dict()) else {
            break;
        };
        if let Ok(obj) = dict.get(b"Resources") {
            return owned_dict(doc, obj).unwrap_or_default();
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    Dictionary::new()
}

/// Current `/Contents` of a page flattened to a list of stream references.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, FirmaError> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    Ok(match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Object::Array(items) => items.clone(),
        _ => Vec::new(),
    })
}

/// Overlay drawn on top of one page.
pub(crate) struct PageCanvas {
    page_id: ObjectId,
    ops: Vec<Operation>,
    fonts: BTreeMap<String, ObjectId>,
    images: BTreeMap<String, ObjectId>,
}

impl PageCanvas {
    pub fn new(page_id: ObjectId) -> Self {
        Self {
            page_id,
            ops: Vec::new(),
            fonts: BTreeMap::new(),
            images: BTreeMap::new(),
        }
    }

    pub fn use_font(&mut self, name: &str, font_id: ObjectId) {
        self.fonts.insert(name.to_string(), font_id);
    }

    pub fn use_image(&mut self, name: &str, image_id: ObjectId) {
        self.images.insert(name.to_string(), image_id);
    }

    pub fn extend(&mut self, ops: Vec<Operation>) {
        self.ops.extend(ops);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append the overlay to the page.
    ///
    /// The original content is bracketed by `q`/`Q` streams so any transform
    /// it leaves active cannot move the overlay. Fonts and images go into a
    /// page-local copy of the effective resources.
    pub fn commit(self, doc: &mut Document) -> Result<(), FirmaError> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let mut resources = effective_resources(doc, self.page_id);
        merge_named(doc, &mut resources, "Font", &self.fonts);
        merge_named(doc, &mut resources, "XObject", &self.images);

        let mut overlay = b"\nQ\n".to_vec();
        overlay.extend(
            Content {
                operations: self.ops,
            }
            .encode()?,
        );

        let mut contents = existing_contents(doc, self.page_id)?;
        let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let overlay_id = doc.add_object(Stream::new(dictionary! {}, overlay));
        contents.insert(0, Object::Reference(save_id));
        contents.push(Object::Reference(overlay_id));

        let page = doc.get_object_mut(self.page_id)?.as_dict_mut()?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
        Ok(())
    }
}

fn merge_named(
    doc: &Document,
    resources: &mut Dictionary,
    category: &str,
    entries: &BTreeMap<String, ObjectId>,
) {
    if entries.is_empty() {
        return;
    }
    let mut dict = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|obj| owned_dict(doc, obj))
        .unwrap_or_default();
    for (name, id) in entries {
        dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
    }
    resources.set(category, Object::Dictionary(dict));
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, FirmaError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Image XObjects keyed by data URL, so a signature placed twice is stored once.
#[derive(Default)]
pub(crate) struct ImageCache {
    by_url: HashMap<String, (String, ObjectId)>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name and object id of the image behind `data_url`.
    pub fn embed(&mut self, doc: &mut Document, data_url: &str) -> Result<(String, ObjectId), FirmaError> {
        if let Some(found) = self.by_url.get(data_url) {
            return Ok(found.clone());
        }
        let image = DataUrl::parse(data_url)?;
        let id = if image.is_png() {
            embed_png(doc, &image.bytes)?
        } else {
            embed_jpeg(doc, image.bytes)?
        };
        let entry = (format!("FirmaIm{}", self.by_url.len()), id);
        self.by_url.insert(data_url.to_string(), entry.clone());
        Ok(entry)
    }
}

/// Decoded to RGB with the alpha channel as a soft mask.
fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId, FirmaError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| FirmaError::ImageError(e.to_string()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in img.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&alpha)?,
    ));
    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(smask_id),
        },
        deflate(&rgb)?,
    )))
}

/// Stored as-is behind `DCTDecode`; only the marker segments are read.
fn embed_jpeg(doc: &mut Document, bytes: Vec<u8>) -> Result<ObjectId, FirmaError> {
    let header = read_jpeg_header(&bytes)?;
    let color_space = match header.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => {
            return Err(FirmaError::ImageError(format!(
                "unsupported JPEG with {} components",
                n
            )))
        }
    };
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => header.width as i64,
        "Height" => header.height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => header.bits_per_component as i64,
        "Filter" => "DCTDecode",
    };
    if header.components == 4 && header.adobe {
        dict.set("Decode", [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec());
    }
    Ok(doc.add_object(Stream::new(dict, bytes)))
}
