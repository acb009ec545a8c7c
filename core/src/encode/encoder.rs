//! GIF89a container writer.
//!
//! Orchestrates per-frame palette analysis, control metadata and LZW pixel
//! data. The first frame's palette becomes the global color table; every
//! later frame carries a local table. Setters apply to the next frame
//! added, not retroactively.

use image::RgbaImage;

use super::{lzw::LzwCompressor, sink::ByteSink};
use crate::{
    error::{Error, Result},
    quant::ColorQuantizer,
};

const PALETTE_SIZE_FLAG: u8 = 7; // 2^(7+1) = 256 entries
const COLOR_DEPTH: u8 = 8;

pub struct GifEncoder {
    width: u16,
    height: u16,

    /// Bytes made visible by `emit`; drained by `get_and_reset_buffer`.
    out: Vec<u8>,
    /// Bytes staged since the last `emit`.
    page: ByteSink,

    started: bool,
    finished: bool,
    first_frame: bool,
    frames_written: usize,

    delay_cs: u16,
    dispose: Option<u8>,
    repeat: Option<u16>,
    transparent: Option<[u8; 3]>,
    transparent_index: u8,
    sample: u8,
}

impl GifEncoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.min(u16::MAX as u32) as u16,
            height: height.min(u16::MAX as u32) as u16,
            out: Vec::new(),
            page: ByteSink::new(),
            started: false,
            finished: false,
            first_frame: true,
            frames_written: 0,
            delay_cs: 0,
            dispose: None,
            repeat: None,
            transparent: None,
            transparent_index: 0,
            sample: 10,
        }
    }

    /// Delay of the next frame added, in centiseconds.
    pub fn set_delay(&mut self, delay_cs: u16) {
        self.delay_cs = delay_cs;
    }

    /// Disposal method of the next frame added.
    pub fn set_dispose(&mut self, method: u8) {
        self.dispose = Some(method & 7);
    }

    /// Netscape loop count; 0 loops forever. Takes effect with the first
    /// frame, so it must be set before `add_frame`.
    pub fn set_repeat(&mut self, count: u16) {
        self.repeat = Some(count);
    }

    /// Color keyed out as transparent in the next frame added; `None`
    /// disables keying again.
    pub fn set_transparent(&mut self, color: Option<[u8; 3]>) {
        self.transparent = color;
    }

    /// Quantizer sampling interval, 1-30. Lower is slower and higher quality.
    pub fn set_quality(&mut self, sample: u8) {
        self.sample = sample.clamp(1, 30);
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::EncoderState("start() called twice"));
        }
        self.started = true;
        self.page.write_str("GIF89a");
        self.emit();
        Ok(())
    }

    pub fn add_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        if !self.started {
            return Err(Error::EncoderState("add_frame() before start()"));
        }
        if self.finished {
            return Err(Error::EncoderState("add_frame() after finish()"));
        }

        let (indexed, palette) = self.analyze(frame);

        if self.first_frame {
            self.write_logical_screen_descriptor();
            self.write_palette(&palette);
            if let Some(count) = self.repeat {
                self.write_netscape_ext(count);
            }
        }
        self.write_graphic_control_ext();
        self.write_image_descriptor();
        if !self.first_frame {
            self.write_palette(&palette);
        }
        LzwCompressor::new(COLOR_DEPTH).encode(&indexed, &mut self.page);

        self.first_frame = false;
        self.frames_written += 1;
        self.emit();
        Ok(())
    }

    /// Writes the trailer byte. Terminal: no further frames may be added.
    pub fn finish(&mut self) -> Result<()> {
        if !self.started {
            return Err(Error::EncoderState("finish() before start()"));
        }
        if self.finished {
            return Err(Error::EncoderState("finish() called twice"));
        }
        self.finished = true;
        self.page.write_u8(0x3B);
        self.emit();
        Ok(())
    }

    /// Drains every emitted byte, leaving the encoder ready to stream more
    /// frames without a full `finish()`.
    pub fn get_and_reset_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    /// Flush boundary between the staging page and the visible buffer.
    fn emit(&mut self) {
        self.out.extend_from_slice(self.page.as_slice());
        self.page.clear();
    }

    /// Quantizes the frame down to 256 colors, producing the indexed pixel
    /// buffer and its palette, and resolving the transparent index.
    fn analyze(&mut self, frame: &RgbaImage) -> (Vec<u8>, Vec<u8>) {
        let mut rgb = Vec::with_capacity(frame.width() as usize * frame.height() as usize * 3);
        for pixel in frame.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
        }

        let mut quantizer = ColorQuantizer::new(rgb, self.sample);
        quantizer.build_colormap();
        let palette = quantizer.color_map();

        let mut indexed = Vec::with_capacity(frame.width() as usize * frame.height() as usize);
        for pixel in frame.pixels() {
            indexed.push(quantizer.lookup_rgb(pixel.0[2], pixel.0[1], pixel.0[0]) as u8);
        }

        self.transparent_index = match self.transparent {
            Some([r, g, b]) => quantizer.lookup_rgb(b, g, r) as u8,
            None => 0,
        };

        (indexed, palette)
    }

    fn write_logical_screen_descriptor(&mut self) {
        self.page.write_u16_le(self.width);
        self.page.write_u16_le(self.height);
        // Global color table, 8 bits of color resolution, 256 entries.
        self.page.write_u8(0x80 | 0x70 | PALETTE_SIZE_FLAG);
        self.page.write_u8(0); // background color index
        self.page.write_u8(0); // pixel aspect ratio
    }

    fn write_palette(&mut self, palette: &[u8]) {
        self.page.write_bytes(palette);
        for _ in palette.len()..768 {
            self.page.write_u8(0);
        }
    }

    fn write_netscape_ext(&mut self, count: u16) {
        self.page.write_u8(0x21);
        self.page.write_u8(0xFF);
        self.page.write_u8(11);
        self.page.write_str("NETSCAPE2.0");
        self.page.write_u8(3);
        self.page.write_u8(1);
        self.page.write_u16_le(count);
        self.page.write_u8(0);
    }

    fn write_graphic_control_ext(&mut self) {
        let (transparency, dispose) = match self.transparent {
            Some(_) => (1, self.dispose.unwrap_or(2)),
            None => (0, self.dispose.unwrap_or(0)),
        };

        self.page.write_u8(0x21);
        self.page.write_u8(0xF9);
        self.page.write_u8(4);
        self.page.write_u8((dispose << 2) | transparency);
        self.page.write_u16_le(self.delay_cs);
        self.page.write_u8(self.transparent_index);
        self.page.write_u8(0);
    }

    fn write_image_descriptor(&mut self) {
        self.page.write_u8(0x2C);
        self.page.write_u16_le(0);
        self.page.write_u16_le(0);
        self.page.write_u16_le(self.width);
        self.page.write_u16_le(self.height);
        if self.first_frame {
            // First frame uses the global color table.
            self.page.write_u8(0);
        } else {
            self.page.write_u8(0x80 | PALETTE_SIZE_FLAG);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn frames_require_start() {
        let mut encoder = GifEncoder::new(4, 4);
        let err = encoder.add_frame(&solid(4, 4, [255, 0, 0, 255]));
        assert!(matches!(err, Err(Error::EncoderState(_))));
    }

    #[test]
    fn finish_is_terminal() {
        let mut encoder = GifEncoder::new(4, 4);
        encoder.start().unwrap();
        encoder.add_frame(&solid(4, 4, [255, 0, 0, 255])).unwrap();
        encoder.finish().unwrap();
        assert!(matches!(
            encoder.add_frame(&solid(4, 4, [255, 0, 0, 255])),
            Err(Error::EncoderState(_))
        ));
        assert!(encoder.finish().is_err());
    }

    #[test]
    fn output_is_well_formed_gif89a() {
        let mut encoder = GifEncoder::new(4, 4);
        encoder.set_repeat(0);
        encoder.set_delay(10);
        encoder.start().unwrap();
        encoder.add_frame(&solid(4, 4, [255, 0, 0, 255])).unwrap();
        encoder.add_frame(&solid(4, 4, [0, 255, 0, 255])).unwrap();
        encoder.finish().unwrap();
        let bytes = encoder.get_and_reset_buffer();

        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(*bytes.last().unwrap(), 0x3B);
        assert!(bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));
    }

    #[test]
    fn buffer_reset_drains_incrementally() {
        let mut encoder = GifEncoder::new(4, 4);
        encoder.start().unwrap();
        let header = encoder.get_and_reset_buffer();
        assert_eq!(&header, b"GIF89a");

        encoder.add_frame(&solid(4, 4, [0, 0, 255, 255])).unwrap();
        let frame_bytes = encoder.get_and_reset_buffer();
        assert!(!frame_bytes.is_empty());
        assert!(!frame_bytes.starts_with(b"GIF89a"));

        encoder.finish().unwrap();
        assert_eq!(encoder.get_and_reset_buffer(), vec![0x3B]);
    }

    #[test]
    fn decodes_with_reference_decoder() {
        use image::codecs::gif::GifDecoder;
        use image::AnimationDecoder;

        let mut encoder = GifEncoder::new(8, 8);
        encoder.set_repeat(0);
        encoder.set_delay(5);
        encoder.start().unwrap();
        encoder.add_frame(&solid(8, 8, [200, 30, 30, 255])).unwrap();
        encoder.add_frame(&solid(8, 8, [30, 200, 30, 255])).unwrap();
        encoder.add_frame(&solid(8, 8, [30, 30, 200, 255])).unwrap();
        encoder.finish().unwrap();
        let bytes = encoder.get_and_reset_buffer();

        let decoder = GifDecoder::new(std::io::Cursor::new(&bytes)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!(frame.buffer().dimensions(), (8, 8));
            let (numerator, denominator) = frame.delay().numer_denom_ms();
            assert_eq!(numerator / denominator.max(1), 50);
        }
        // Solid frames must quantize to their own color.
        let first = frames[0].buffer().get_pixel(0, 0);
        assert!(first.0[0] > 150 && first.0[1] < 80 && first.0[2] < 80);
    }
}
