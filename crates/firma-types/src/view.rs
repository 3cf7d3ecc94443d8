//! The viewer state that position updates are computed against.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A page reports 0×0 until it has finished loading.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Current page, its unscaled size, and the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub dimensions: Size,
    pub scale: f64,
    pub current_page: u32,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            dimensions: Size::default(),
            scale: 1.0,
            current_page: 1,
        }
    }
}

impl PageView {
    pub fn new(dimensions: Size, scale: f64, current_page: u32) -> Self {
        Self {
            dimensions,
            scale,
            current_page,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Rendered size in on-screen pixels
    pub fn scaled_size(&self) -> Size {
        Size {
            width: self.dimensions.width * self.scale,
            height: self.dimensions.height * self.scale,
        }
    }
}
