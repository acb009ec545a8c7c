//! Hue cycling.
//!
//! Each output frame shifts every visible pixel's hue by its slot in a
//! `32 * step` frame cycle. Near-achromatic pixels have no stable hue of
//! their own (channel noise would make them strobe), so the dark and light
//! classes each get one random base hue for the whole render and cycle from
//! there.

use image::Rgba;
use rand::Rng;
use rayon::prelude::*;

use crate::{
    align::align,
    color::ConvertToHsl,
    error::Result,
    media::{Frame, FrameSequence},
};

const DARK_MAX: u8 = 30;
const LIGHT_MIN: u8 = 220;

pub fn rainbow(sequence: &FrameSequence, step: u32) -> Result<FrameSequence> {
    let interval = (32 * step).max(1) as usize;
    let degrees_per_frame = 360.0 / interval as f32;

    let mut rng = rand::thread_rng();
    let dark_hue: f32 = rng.gen_range(0.0..360.0);
    let light_hue: f32 = rng.gen_range(0.0..360.0);

    let aligned = align(&sequence.frames, interval);
    let frames: Vec<Frame> = aligned
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let offset = (i % interval) as f32 * degrees_per_frame;
            let mut buffer = frame.buffer.clone();
            for pixel in buffer.pixels_mut() {
                let Rgba([r, g, b, a]) = *pixel;
                if a == 0 {
                    continue;
                }
                let mut hsl = pixel.to_hsl();
                if r <= DARK_MAX && g <= DARK_MAX && b <= DARK_MAX {
                    hsl.h = dark_hue;
                } else if r >= LIGHT_MIN && g >= LIGHT_MIN && b >= LIGHT_MIN {
                    hsl.h = light_hue;
                }
                let rgb = hsl.shift_hue(offset).to_rgb();
                *pixel = Rgba([rgb.0[0], rgb.0[1], rgb.0[2], a]);
            }
            Frame::new(buffer, frame.delay_cs)
        })
        .collect();

    Ok(FrameSequence::from_frames(frames, sequence.loop_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn output_length_is_cycle_multiple() {
        let frames = vec![Frame::new(
            RgbaImage::from_pixel(4, 4, Rgba([200, 50, 50, 255])),
            4,
        )];
        let sequence = FrameSequence::from_frames(frames, None);
        let cycled = rainbow(&sequence, 2).unwrap();
        assert_eq!(cycled.len() % 64, 0);
    }

    #[test]
    fn transparent_pixels_stay_transparent() {
        let frames = vec![Frame::new(RgbaImage::new(4, 4), 4)];
        let sequence = FrameSequence::from_frames(frames, None);
        let cycled = rainbow(&sequence, 2).unwrap();
        assert!(cycled.frames[0]
            .buffer
            .pixels()
            .all(|p| p.0[3] == 0));
    }

    #[test]
    fn hue_actually_rotates_saturated_pixels() {
        let frames = vec![Frame::new(
            RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])),
            4,
        )];
        let sequence = FrameSequence::from_frames(frames, None);
        let cycled = rainbow(&sequence, 2).unwrap();
        // A quarter of the way through the cycle red has moved well away.
        let quarter = &cycled.frames[16].buffer;
        let pixel = quarter.get_pixel(0, 0);
        assert!(pixel.0[0] < 255 || pixel.0[1] > 0 || pixel.0[2] > 0);
        assert!(pixel.0[1] > 100, "expected hue rotation toward green, got {:?}", pixel);
    }
}
