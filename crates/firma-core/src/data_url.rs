//! `data:` URL handling for signature images and in-memory documents.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::error::FirmaError;

#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self, FirmaError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| FirmaError::InvalidDataUrl("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| FirmaError::InvalidDataUrl("missing ',' separator".to_string()))?;

        let mut parts = header.split(';');
        let mime = match parts.next() {
            Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
            _ => "text/plain".to_string(),
        };
        let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            B64.decode(cleaned.as_bytes())
                .map_err(|e| FirmaError::InvalidDataUrl(e.to_string()))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self { mime, bytes })
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, B64.encode(bytes))
    }

    pub fn is_png(&self) -> bool {
        self.mime == "image/png"
    }
}

/// Guess an image MIME type from magic bytes; used when importing files.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        _ => None,
    }
}

/// Pixel dimensions of an encoded image without decoding the pixel data.
pub fn measure_image(bytes: &[u8]) -> Result<(u32, u32), FirmaError> {
    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FirmaError::ImageError(e.to_string()))?
        .into_dimensions()
        .map_err(|e| FirmaError::ImageError(e.to_string()))
}

/// Frame parameters read from a JPEG's markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHeader {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    /// 1 gray, 3 YCbCr/RGB, 4 CMYK/YCCK
    pub components: u8,
    /// An Adobe APP14 segment precedes the frame; CMYK samples are inverted.
    pub adobe: bool,
}

fn jpeg_error(msg: &str) -> FirmaError {
    FirmaError::ImageError(format!("JPEG: {}", msg))
}

/// Walk the marker segments up to the first start-of-frame.
pub fn read_jpeg_header(bytes: &[u8]) -> Result<JpegHeader, FirmaError> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return Err(jpeg_error("missing SOI marker"));
    }
    let mut pos = 2;
    let mut adobe = false;
    loop {
        if bytes.get(pos) != Some(&0xFF) {
            return Err(jpeg_error("expected a marker"));
        }
        // Fill bytes
        while bytes.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *bytes.get(pos).ok_or_else(|| jpeg_error("no frame header"))?;
        pos += 1;
        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return Err(jpeg_error("no frame header")),
            _ => {}
        }

        let len = bytes
            .get(pos..pos + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]) as usize)
            .ok_or_else(|| jpeg_error("truncated segment"))?;
        if len < 2 {
            return Err(jpeg_error("invalid segment length"));
        }
        let segment = bytes
            .get(pos + 2..pos + len)
            .ok_or_else(|| jpeg_error("truncated segment"))?;

        match marker {
            0xEE if segment.starts_with(b"Adobe") => adobe = true,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                if segment.len() < 6 {
                    return Err(jpeg_error("truncated frame header"));
                }
                return Ok(JpegHeader {
                    bits_per_component: segment[0],
                    height: u16::from_be_bytes([segment[1], segment[2]]) as u32,
                    width: u16::from_be_bytes([segment[3], segment[4]]) as u32,
                    components: segment[5],
                    adobe,
                });
            }
            _ => {}
        }
        pos += len;
    }
}

/// SOI, optional Adobe APP14, then a baseline frame header.
#[cfg(test)]
pub(crate) fn jpeg_headers(components: u8, adobe: bool) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    bytes.extend_from_slice(b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
    if adobe {
        bytes.extend_from_slice(&[0xFF, 0xEE, 0x00, 0x0E]);
        bytes.extend_from_slice(b"Adobe\0\x64\0\0\0\0\x02");
    }
    let frame_len = 8 + 3 * components as u16;
    bytes.extend_from_slice(&[0xFF, 0xFF, 0xC0]);
    bytes.extend_from_slice(&frame_len.to_be_bytes());
    bytes.extend_from_slice(&[8, 0x00, 0x21, 0x00, 0x2C, components]);
    for id in 1..=components {
        bytes.extend_from_slice(&[id, 0x11, 0]);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base64_png() {
        let url = DataUrl::encode("image/png", b"\x89PNG");
        let parsed = DataUrl::parse(&url).unwrap();
        assert!(parsed.is_png());
        assert_eq!(parsed.bytes, b"\x89PNG");
    }

    #[test]
    fn test_parse_raw_payload() {
        let parsed = DataUrl::parse("data:text/plain,hello").unwrap();
        assert_eq!(parsed.mime, "text/plain");
        assert_eq!(parsed.bytes, b"hello");
    }

    #[test]
    fn test_rejects_non_data_url() {
        assert!(matches!(
            DataUrl::parse("https://example.com/sig.png"),
            Err(FirmaError::InvalidDataUrl(_))
        ));
        assert!(DataUrl::parse("data:image/png;base64").is_err());
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(DataUrl::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_jpeg_header_reports_cmyk_components() {
        let header = read_jpeg_header(&jpeg_headers(4, true)).unwrap();
        assert_eq!(
            header,
            JpegHeader {
                width: 44,
                height: 33,
                bits_per_component: 8,
                components: 4,
                adobe: true,
            }
        );
        assert!(!read_jpeg_header(&jpeg_headers(3, false)).unwrap().adobe);
    }

    #[test]
    fn test_jpeg_header_from_encoder() {
        let img = image::GrayImage::new(12, 5);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        let header = read_jpeg_header(&bytes).unwrap();
        assert_eq!((header.width, header.height, header.components), (12, 5, 1));
    }

    #[test]
    fn test_jpeg_header_rejects_truncated_input() {
        let bytes = jpeg_headers(3, false);
        assert!(read_jpeg_header(&bytes[..bytes.len() - 12]).is_err());
        assert!(read_jpeg_header(b"\x89PNG").is_err());
        // Scan data before any frame
        assert!(read_jpeg_header(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02]).is_err());
    }

    #[test]
    fn test_measure_png() {
        let img = image::RgbaImage::new(40, 10);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(measure_image(&bytes).unwrap(), (40, 10));
        assert_eq!(sniff_image_mime(&bytes), Some("image/png"));
    }
}
