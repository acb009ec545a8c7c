//! Fixed rotation and the spin family.
//!
//! Rotation happens on a square canvas of side `max(width, height)` with the
//! source centered, so no corner is ever clipped mid-turn. Sampling is
//! inverse-mapped with bilinear interpolation; pixels falling outside the
//! source stay transparent.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::{
    align::align,
    error::Result,
    media::{Frame, FrameSequence},
};

pub fn rotate_sequence(sequence: &FrameSequence, degrees: f32) -> FrameSequence {
    let frames: Vec<Frame> = sequence
        .frames
        .par_iter()
        .map(|frame| Frame::new(rotate_buffer(&frame.buffer, degrees), frame.delay_cs))
        .collect();
    FrameSequence::from_frames(frames, sequence.loop_count)
}

/// Positive `step` values spin slower; direction flips for `spinrev`.
pub fn spin(sequence: &FrameSequence, step: u32, reverse: bool) -> Result<FrameSequence> {
    let delay = sequence.first_delay().max(2);
    let centisecs_per_rotation = 200.0 * step as f32 / 8.0;
    let degrees = 360.0 * delay as f32 / centisecs_per_rotation;
    let interval = ((360.0 / degrees).floor() as usize).max(1);
    log::debug!(
        "spin: delay {} cs, {:.2} degrees/frame, interval {}",
        delay,
        degrees,
        interval
    );

    let aligned = align(&sequence.frames, interval);
    let sign = if reverse { -1.0 } else { 1.0 };

    let frames: Vec<Frame> = aligned
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let angle = sign * (i % interval) as f32 * degrees;
            Frame::new(rotate_buffer(&frame.buffer, angle), frame.delay_cs)
        })
        .collect();

    Ok(FrameSequence::from_frames(frames, sequence.loop_count))
}

fn rotate_buffer(src: &RgbaImage, degrees: f32) -> RgbaImage {
    let side = src.width().max(src.height());
    let mut out = RgbaImage::new(side, side);

    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let center = side as f32 / 2.0;
    let src_cx = src.width() as f32 / 2.0;
    let src_cy = src.height() as f32 / 2.0;

    for y in 0..side {
        for x in 0..side {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let sx = dx * cos + dy * sin + src_cx - 0.5;
            let sy = -dx * sin + dy * cos + src_cy - 0.5;
            out.put_pixel(x, y, sample_bilinear(src, sx, sy));
        }
    }

    out
}

fn sample_bilinear(src: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    if x < -1.0 || y < -1.0 || x > src.width() as f32 || y > src.height() as f32 {
        return Rgba([0, 0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let pick = |px: f32, py: f32| -> [f32; 4] {
        if px < 0.0 || py < 0.0 || px >= src.width() as f32 || py >= src.height() as f32 {
            [0.0; 4]
        } else {
            let p = src.get_pixel(px as u32, py as u32);
            [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32, p.0[3] as f32]
        }
    };

    let p00 = pick(x0, y0);
    let p10 = pick(x0 + 1.0, y0);
    let p01 = pick(x0, y0 + 1.0);
    let p11 = pick(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}
