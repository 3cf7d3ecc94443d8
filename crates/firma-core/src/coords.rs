//! Coordinate transformation between screen, normalized and PDF coordinate systems
//!
//! Fields store their anchor as a fraction of the page size (origin top-left).
//! Screen positions are zoom-scaled pixels; PDF user space has its origin at the
//! bottom-left of the media box with Y increasing upward.

use firma_types::Size;
use serde::{Deserialize, Serialize};

/// Horizontal correction between the editor's input box and the text baseline.
pub const FIELD_X_OFFSET: f64 = 4.0;
/// Vertical correction between the editor's line box and the text baseline.
pub const FIELD_Y_OFFSET: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn clamped(self) -> Self {
        Self {
            x: clamp_unit(self.x),
            y: clamp_unit(self.y),
        }
    }
}

/// Page rectangle in PDF user space: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl MediaBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from the four numbers of a `/MediaBox` array (`llx lly urx ury`).
    pub fn from_corners(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        let (x0, x1) = if llx <= urx { (llx, urx) } else { (urx, llx) };
        let (y0, y1) = if lly <= ury { (lly, ury) } else { (ury, lly) };
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Baseline correction applied to text fields on export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOffset {
    pub x: f64,
    pub y: f64,
}

impl Default for TextOffset {
    fn default() -> Self {
        Self {
            x: FIELD_X_OFFSET,
            y: FIELD_Y_OFFSET,
        }
    }
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Convert an on-screen position to a normalized anchor.
///
/// Returns `None` while the page has no size yet (not loaded); callers treat
/// that as a no-op rather than dividing by zero.
pub fn normalize(point: ScreenPoint, scaled: Size) -> Option<NormalizedPoint> {
    if scaled.is_empty() {
        return None;
    }
    Some(NormalizedPoint {
        x: clamp_unit(point.x / scaled.width),
        y: clamp_unit(point.y / scaled.height),
    })
}

/// Convert a normalized anchor back to on-screen pixels.
pub fn denormalize(point: NormalizedPoint, scaled: Size) -> ScreenPoint {
    ScreenPoint {
        x: point.x * scaled.width,
        y: point.y * scaled.height,
    }
}

/// PDF position of a text field's baseline origin.
pub fn text_origin(
    anchor: NormalizedPoint,
    font_size: f64,
    media_box: MediaBox,
    offset: TextOffset,
) -> (f64, f64) {
    let anchor = anchor.clamped();
    let pdf_x = media_box.x + anchor.x * media_box.width + offset.x;
    let pdf_y =
        media_box.y + media_box.height - anchor.y * media_box.height - font_size - offset.y;
    (pdf_x, pdf_y)
}

/// PDF position of an image's lower-left corner. The anchor is the image's top edge.
pub fn image_origin(anchor: NormalizedPoint, height: f64, media_box: MediaBox) -> (f64, f64) {
    let anchor = anchor.clamped();
    let pdf_x = media_box.x + anchor.x * media_box.width;
    let pdf_y = media_box.y + media_box.height - anchor.y * media_box.height - height;
    (pdf_x, pdf_y)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    // Strategy for valid positive dimensions
    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..4000.0
    }

    fn unit() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    proptest! {
        /// Property: normalized → screen → normalized returns the original anchor
        #[test]
        fn roundtrip_normalized_screen_normalized(
            x in unit(),
            y in unit(),
            w in dimension(),
            h in dimension(),
        ) {
            let scaled = Size::new(w, h);
            let screen = denormalize(NormalizedPoint::new(x, y), scaled);
            let back = normalize(screen, scaled).unwrap();

            let tolerance = 1e-9;
            prop_assert!((back.x - x).abs() < tolerance, "X: {} vs {}", back.x, x);
            prop_assert!((back.y - y).abs() < tolerance, "Y: {} vs {}", back.y, y);
        }

        /// Property: drags past the page edge always land inside the unit square
        #[test]
        fn out_of_range_positions_clamp(
            px in -10_000.0f64..10_000.0,
            py in -10_000.0f64..10_000.0,
            w in dimension(),
            h in dimension(),
        ) {
            let n = normalize(ScreenPoint { x: px, y: py }, Size::new(w, h)).unwrap();
            prop_assert!((0.0..=1.0).contains(&n.x));
            prop_assert!((0.0..=1.0).contains(&n.y));
        }

        /// Property: the same anchor keeps its relative position across zoom levels
        #[test]
        fn zoom_independent_anchor(
            x in unit(),
            y in unit(),
            w in dimension(),
            h in dimension(),
            zoom in 0.5f64..2.0,
        ) {
            let base = Size::new(w, h);
            let zoomed = Size::new(w * zoom, h * zoom);
            let a = denormalize(NormalizedPoint::new(x, y), base);
            let b = denormalize(NormalizedPoint::new(x, y), zoomed);
            prop_assert!((b.x - a.x * zoom).abs() < 1e-6);
            prop_assert!((b.y - a.y * zoom).abs() < 1e-6);
        }

        /// Property: a larger normalized y always lands lower on the PDF page
        #[test]
        fn y_axis_flip(
            y1 in unit(),
            y2 in unit(),
            h in dimension(),
        ) {
            let media_box = MediaBox::new(0.0, 0.0, 612.0, h);
            let (_, a) = image_origin(NormalizedPoint::new(0.0, y1), 0.0, media_box);
            let (_, b) = image_origin(NormalizedPoint::new(0.0, y2), 0.0, media_box);
            if y1 < y2 {
                prop_assert!(a >= b);
            }
        }
    }
}
