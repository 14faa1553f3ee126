use tracing::debug;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{FRAMES_Y, FrameSize, Offset};
use crate::foundation::error::{SpriteError, SpriteResult};
use crate::layering::builder::LayerDrawRequest;
use crate::render::surface::{DstRect, PixelSource, SrcRect, Surface};

/// Paint loaded layers bottom to top onto a fresh 3x4 sheet.
///
/// The sheet is `frame` sized per cell, doubled when `upscale` is set. Every request must already
/// be loaded; hidden requests are skipped.
#[tracing::instrument(skip(requests), fields(layers = requests.len()))]
pub fn composite(
    requests: &[LayerDrawRequest],
    frame: FrameSize,
    upscale: bool,
) -> SpriteResult<Surface> {
    let images = requests
        .iter()
        .map(|req| {
            req.image
                .image()
                .filter(|_| req.image.is_ready())
                .ok_or_else(|| {
                    SpriteError::asset_load(format!("layer '{}' is not loaded", req.asset_key))
                })
        })
        .collect::<SpriteResult<Vec<_>>>()?;

    let scale = if upscale { 2 } else { 1 };
    let (w, h) = frame.scaled(scale).sheet();
    let mut sheet = Surface::new(w, h);

    for (req, img) in requests.iter().zip(&images) {
        if req.hidden {
            debug!(layer = %req.layer, "skip hidden layer");
            continue;
        }
        draw_layer(&mut sheet, img, req.offset, frame, scale);
    }
    Ok(sheet)
}

fn draw_layer(
    sheet: &mut Surface,
    img: &PreparedImage,
    offset: Offset,
    frame: FrameSize,
    scale: u32,
) {
    let (img_w, img_h) = img.dimensions();
    let s = i64::from(scale);
    let (ox, oy) = (i64::from(offset.x), i64::from(offset.y));
    let whole = SrcRect {
        x: 0,
        y: 0,
        w: img_w,
        h: img_h,
    };

    if offset.x == 0 {
        let to = if scale == 1 {
            DstRect {
                x: ox,
                y: oy,
                w: img_w,
                h: img_h,
            }
        } else {
            DstRect {
                x: ox * s,
                y: oy * s,
                w: sheet.width,
                h: sheet.height,
            }
        };
        sheet.draw(img, whole, to);
        return;
    }

    // Horizontal offsets mirror with the facing: east rows shift right, west rows shift left.
    for band in 0..FRAMES_Y {
        let shift = match band {
            1 => ox,
            3 => -ox,
            _ => 0,
        };
        let from = SrcRect {
            x: 0,
            y: band * frame.height,
            w: img_w,
            h: frame.height,
        };
        let to = DstRect {
            x: shift * s,
            y: (i64::from(band * frame.height) + oy) * s,
            w: img_w * scale,
            h: frame.height * scale,
        };
        sheet.draw(img, from, to);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
