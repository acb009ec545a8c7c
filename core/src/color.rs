use image::{Rgb, Rgba};

/// Hue in degrees [0, 360), saturation and lightness in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

pub trait ConvertToHsl {
    fn to_hsl(&self) -> Hsl;
}

impl Hsl {
    pub fn shift_hue(mut self, degrees: f32) -> Self {
        self.h = (self.h + degrees).rem_euclid(360.0);
        self
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        if self.s <= 0.0 {
            let v = (self.l.clamp(0.0, 1.0) * 255.0).round() as u8;
            return Rgb([v, v, v]);
        }

        let l = self.l.clamp(0.0, 1.0);
        let s = self.s.clamp(0.0, 1.0);
        let h = self.h.rem_euclid(360.0) / 360.0;

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
        let g = hue_to_rgb(p, q, h);
        let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

        Rgb([
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        ])
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl ConvertToHsl for Rgb<u8> {
    fn to_hsl(&self) -> Hsl {
        let r = self.0[0] as f32 / 255.0;
        let g = self.0[1] as f32 / 255.0;
        let b = self.0[2] as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsl { h: h * 60.0, s, l }
    }
}

impl ConvertToHsl for Rgba<u8> {
    fn to_hsl(&self) -> Hsl {
        Rgb([self.0[0], self.0[1], self.0[2]]).to_hsl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32, tolerance: f32, what: &str) {
        assert!(
            (a - b).abs() <= tolerance,
            "{} mismatch: {} vs {}",
            what,
            a,
            b
        );
    }

    #[test]
    fn rgb_hsl_round_trip() {
        let samples = [
            Rgb([255u8, 0, 0]),
            Rgb([0, 255, 0]),
            Rgb([0, 0, 255]),
            Rgb([120, 200, 40]),
            Rgb([17, 42, 230]),
            Rgb([200, 100, 100]),
        ];
        for rgb in samples {
            let back = rgb.to_hsl().to_rgb();
            for c in 0..3 {
                assert!(
                    (rgb.0[c] as i32 - back.0[c] as i32).abs() <= 1,
                    "channel {} of {:?} round-tripped to {:?}",
                    c,
                    rgb,
                    back
                );
            }
        }
    }

    #[test]
    fn hsl_rgb_round_trip() {
        let samples = [
            Hsl { h: 0.0, s: 1.0, l: 0.5 },
            Hsl { h: 120.0, s: 0.7, l: 0.4 },
            Hsl { h: 270.0, s: 0.3, l: 0.6 },
        ];
        for hsl in samples {
            let back = hsl.to_rgb().to_hsl();
            assert_close(hsl.h, back.h, 2.0, "hue");
            assert_close(hsl.s, back.s, 0.02, "saturation");
            assert_close(hsl.l, back.l, 0.02, "lightness");
        }
    }

    #[test]
    fn achromatic_has_zero_saturation() {
        let hsl = Rgb([128u8, 128, 128]).to_hsl();
        assert_eq!(hsl.s, 0.0);
        assert_eq!(hsl.h, 0.0);
    }

    #[test]
    fn shift_hue_wraps() {
        let hsl = Hsl { h: 350.0, s: 1.0, l: 0.5 };
        assert_close(hsl.shift_hue(20.0).h, 10.0, 0.001, "wrapped hue");
    }
}
