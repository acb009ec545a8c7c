//! Concentric zoom tunnel.
//!
//! Five nested copies of the frame at geometrically decreasing scale, all
//! growing outward each frame. After `2 * step` frames every ring has taken
//! the place of the one outside it, so the cycle maps onto itself and the
//! loop is seamless.

use image::{imageops, RgbaImage};
use rayon::prelude::*;

use crate::{
    align::align,
    error::Result,
    media::{Frame, FrameSequence},
};

const SCALES_AMOUNT: u32 = 5;
const FALLOFF: f32 = 0.9;

pub fn infinite(sequence: &FrameSequence, step: u32) -> Result<FrameSequence> {
    let (width, height) = (sequence.width, sequence.height);
    let interval = (2 * step).max(1) as usize;

    let aligned = align(&sequence.frames, interval);
    let frames: Vec<Frame> = aligned
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let t = (i % interval) as f32 / interval as f32;
            let mut canvas = RgbaImage::new(width, height);
            // Outermost ring first so the smaller copies overlay the center.
            for ring in 0..SCALES_AMOUNT {
                let scale = FALLOFF.powf(ring as f32 - t);
                let scaled_w = ((width as f32 * scale).round() as u32).max(1);
                let scaled_h = ((height as f32 * scale).round() as u32).max(1);
                let scaled = imageops::resize(
                    &frame.buffer,
                    scaled_w,
                    scaled_h,
                    imageops::FilterType::Triangle,
                );
                let x = (width as i64 - scaled_w as i64) / 2;
                let y = (height as i64 - scaled_h as i64) / 2;
                imageops::overlay(&mut canvas, &scaled, x, y);
            }
            Frame::new(canvas, frame.delay_cs)
        })
        .collect();

    Ok(FrameSequence::from_frames(frames, sequence.loop_count))
}
