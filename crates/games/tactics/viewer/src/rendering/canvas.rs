//! Drawing surfaces.

use image::{ImageResult, Pixel, Rgba, RgbaImage};
use std::path::Path;

/// Axis-aligned rectangle in pixels. Destination origins may be negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// 2D drawing surface the renderers write to.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    /// Blit `src` of `image` scaled into `dst`.
    fn draw_image(&mut self, image: &RgbaImage, src: Rect, dst: Rect);
    fn fill_rect(&mut self, dst: Rect, color: Rgba<u8>);
}

/// Canvas backed by an RGBA buffer, with nearest-neighbour scaling and
/// source-over alpha blending.
#[derive(Clone, Debug)]
pub struct PixelCanvas {
    image: RgbaImage,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        self.image.save(path)
    }

    fn blend_at(&mut self, x: i64, y: i64, color: &Rgba<u8>) {
        if color[3] == 0 || x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let target = self.image.get_pixel_mut(x as u32, y as u32);
        if color[3] == u8::MAX {
            *target = *color;
        } else {
            target.blend(color);
        }
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, src: Rect, dst: Rect) {
        if src.w == 0 || src.h == 0 {
            return;
        }
        for dy in 0..dst.h {
            let sy = src.y as i64 + (dy as i64 * src.h as i64) / dst.h as i64;
            if sy < 0 || sy >= image.height() as i64 {
                continue;
            }
            for dx in 0..dst.w {
                let sx = src.x as i64 + (dx as i64 * src.w as i64) / dst.w as i64;
                if sx < 0 || sx >= image.width() as i64 {
                    continue;
                }
                let color = *image.get_pixel(sx as u32, sy as u32);
                self.blend_at(dst.x as i64 + dx as i64, dst.y as i64 + dy as i64, &color);
            }
        }
    }

    fn fill_rect(&mut self, dst: Rect, color: Rgba<u8>) {
        for dy in 0..dst.h {
            for dx in 0..dst.w {
                self.blend_at(dst.x as i64 + dx as i64, dst.y as i64 + dy as i64, &color);
            }
        }
    }
}
