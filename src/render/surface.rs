use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::assets::decode::{PreparedImage, unpremultiply_rgba8_in_place};
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::render::blend::{PremulRgba8, over};

/// Anything pixels can be sampled from.
pub trait PixelSource {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Premultiplied pixel; `(x, y)` is in bounds.
    fn pixel_at(&self, x: u32, y: u32) -> PremulRgba8;
}

impl PixelSource for PreparedImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_at(&self, x: u32, y: u32) -> PremulRgba8 {
        self.pixel(x, y)
    }
}

/// Premultiplied RGBA8 drawing target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub data: Vec<u8>,
}

impl PixelSource for Surface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_at(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// Source rectangle in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SrcRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

/// Destination rectangle; may extend past the surface on any side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DstRect {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Pixel at `(x, y)`, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        (x < self.width && y < self.height).then(|| self.pixel_at(x, y))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    fn put(&mut self, x: u32, y: u32, px: PremulRgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Draw `from` of `src` scaled into `to` with nearest-neighbour sampling and source-over.
    ///
    /// Pixels outside this surface or outside the source are skipped.
    pub fn draw(&mut self, src: &impl PixelSource, from: SrcRect, to: DstRect) {
        self.draw_with(src, from, to, over);
    }

    /// Like [`Surface::draw`] but replaces destination pixels instead of blending.
    pub fn copy(&mut self, src: &impl PixelSource, from: SrcRect, to: DstRect) {
        self.draw_with(src, from, to, |_, s| s);
    }

    fn draw_with(
        &mut self,
        src: &impl PixelSource,
        from: SrcRect,
        to: DstRect,
        op: impl Fn(PremulRgba8, PremulRgba8) -> PremulRgba8,
    ) {
        if from.w == 0 || from.h == 0 || to.w == 0 || to.h == 0 {
            return;
        }
        let (src_w, src_h) = src.dimensions();

        for ty in 0..to.h {
            let dy = to.y + i64::from(ty);
            if dy < 0 || dy >= i64::from(self.height) {
                continue;
            }
            let sy = u64::from(from.y) + sample(ty, from.h, to.h);
            if sy >= u64::from(src_h) {
                continue;
            }

            for tx in 0..to.w {
                let dx = to.x + i64::from(tx);
                if dx < 0 || dx >= i64::from(self.width) {
                    continue;
                }
                let sx = u64::from(from.x) + sample(tx, from.w, to.w);
                if sx >= u64::from(src_w) {
                    continue;
                }

                let (dx, dy) = (dx as u32, dy as u32);
                let s = src.pixel_at(sx as u32, sy as u32);
                let d = self.pixel_at(dx, dy);
                self.put(dx, dy, op(d, s));
            }
        }
    }

    /// Straight-alpha RGBA8 copy of the pixels.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut rgba = self.data.clone();
        unpremultiply_rgba8_in_place(&mut rgba);
        rgba
    }

    /// Encode as a straight-alpha PNG.
    pub fn to_png(&self) -> SpriteResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba8())
            .ok_or_else(|| {
                SpriteError::validation("surface buffer does not match its dimensions")
            })?;
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode surface as PNG")?;
        Ok(buf)
    }

    /// Encode as PNG and write it to `path`, creating parent directories.
    pub fn write_png(&self, path: impl AsRef<Path>) -> SpriteResult<()> {
        let path = path.as_ref();
        let bytes = self.to_png()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

// Nearest source offset for destination offset `t` when stretching `src_len` over `dst_len`.
fn sample(t: u32, src_len: u32, dst_len: u32) -> u64 {
    (2 * u64::from(t) + 1) * u64::from(src_len) / (2 * u64::from(dst_len))
}

/// Encode a composited sheet as PNG bytes.
pub fn build_png(surface: &Surface) -> SpriteResult<Vec<u8>> {
    surface.to_png()
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
