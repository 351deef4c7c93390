/*
 * Owned 32-bit pixel images handed to the Graphics Backend. Pixels are stored
 * row-major as `0xAARRGGBB`, which is also the in-memory layout of a 32bpp
 * top-down DIB on little-endian Windows.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Straight (non-premultiplied) alpha, as produced by image decoders.
    Argb32,
    /// Color channels already multiplied by alpha, as layered windows expect.
    PremultipliedArgb32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    size: Size,
    format: PixelFormat,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(size: Size, format: PixelFormat, pixels: Vec<u32>) -> PlatformResult<Self> {
        if size.width <= 0 || size.height <= 0 {
            return Err(PlatformError::Configuration(format!(
                "Pixel buffer needs a positive size, got {size:?}"
            )));
        }
        let expected = size.width as usize * size.height as usize;
        if pixels.len() != expected {
            return Err(PlatformError::Configuration(format!(
                "Pixel buffer of {size:?} needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            size,
            format,
            pixels,
        })
    }

    /// A fully transparent buffer.
    pub fn transparent(size: Size, format: PixelFormat) -> PlatformResult<Self> {
        let count = size.width.max(0) as usize * size.height.max(0) as usize;
        Self::new(size, format, vec![0; count])
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels
            .get((y * self.size.width + x) as usize)
            .copied()
    }

    /*
     * Returns a premultiplied copy. Buffers that are already premultiplied are
     * cloned unchanged.
     */
    pub fn premultiplied(&self) -> PixelBuffer {
        let pixels = match self.format {
            PixelFormat::PremultipliedArgb32 => self.pixels.clone(),
            PixelFormat::Argb32 => self.pixels.iter().map(|&p| premultiply(p)).collect(),
        };
        PixelBuffer {
            size: self.size,
            format: PixelFormat::PremultipliedArgb32,
            pixels,
        }
    }

    /*
     * Bounding box of every pixel whose alpha is non-zero, or `None` for a
     * fully transparent image. Theme templates carry wide transparent borders;
     * this is how their useful area is located.
     */
    pub fn trimmed_bounds(&self) -> Option<Rect> {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for y in 0..self.size.height {
            let row = &self.pixels[(y * self.size.width) as usize..][..self.size.width as usize];
            for (x, &p) in row.iter().enumerate() {
                if p >> 24 == 0 {
                    continue;
                }
                let x = x as i32;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
        (max_x >= min_x).then(|| Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}

fn premultiply(pixel: u32) -> u32 {
    let a = pixel >> 24;
    let scale = |c: u32| (c * a + 127) / 255;
    let r = scale((pixel >> 16) & 0xFF);
    let g = scale((pixel >> 8) & 0xFF);
    let b = scale(pixel & 0xFF);
    (a << 24) | (r << 16) | (g << 8) | b
}
