//! Per-command frame transforms.
//!
//! Every effect consumes a source sequence and produces a brand-new one;
//! source frames are never mutated in place so later commands can replay
//! them safely.

pub mod geometry;
pub mod infinite;
pub mod rain;
pub mod rainbow;
pub mod rotate;
pub mod shake;
pub mod slide;
pub mod wiggle;

use image::RgbaImage;

use crate::media::Frame;

/// Copies a sub-rectangle of `src` into `dst` at the given offset, clipped
/// on all sides.
pub(crate) fn blit(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    dst_x: i64,
    dst_y: i64,
    src_x: u32,
    src_y: u32,
    width: u32,
    height: u32,
) {
    for row in 0..height {
        let sy = src_y + row;
        let dy = dst_y + row as i64;
        if sy >= src.height() || dy < 0 || dy >= dst.height() as i64 {
            continue;
        }
        for col in 0..width {
            let sx = src_x + col;
            let dx = dst_x + col as i64;
            if sx >= src.width() || dx < 0 || dx >= dst.width() as i64 {
                continue;
            }
            dst.put_pixel(dx as u32, dy as u32, *src.get_pixel(sx, sy));
        }
    }
}

/// Folds frames whose delay fell below `min_cs` into a neighbor so the
/// encoder never emits sub-minimum delays.
pub(crate) fn normalize_delays(frames: Vec<Frame>, min_cs: u32) -> Vec<Frame> {
    let mut out: Vec<Frame> = Vec::with_capacity(frames.len());
    for frame in frames {
        if frame.delay_cs < min_cs {
            match out.last_mut() {
                Some(previous) => previous.delay_cs += frame.delay_cs,
                None => out.push(frame),
            }
        } else {
            out.push(frame);
        }
    }
    // A short leading frame could not merge backwards; fold it forwards.
    if out.len() >= 2 && out[0].delay_cs < min_cs {
        let short = out.remove(0);
        out[0].delay_cs += short.delay_cs;
    }
    out
}
