use crate::{
    error::Result,
    media::{Frame, FrameSequence, DEFAULT_DELAY_CS},
};

use image::RgbaImage;

use std::io::{BufWriter, Cursor};

use png::{BitDepth, ColorType, Encoder};

#[derive(Clone, Debug)]
pub struct Image {
    pub buffer: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn from_memory(image_bytes: &[u8]) -> Result<Self> {
        let dynamic_image = image::load_from_memory(image_bytes)?;
        let buffer = dynamic_image.into_rgba8();
        let width = buffer.width();
        let height = buffer.height();
        Ok(Self {
            buffer,
            width,
            height,
        })
    }

    pub fn from_buffer(buffer: RgbaImage) -> Self {
        let width = buffer.width();
        let height = buffer.height();
        Self {
            buffer,
            width,
            height,
        }
    }

    /// Static sources still carry a delay so that a timeline effect can pick
    /// them up unchanged.
    pub fn into_sequence(self) -> FrameSequence {
        FrameSequence::from_frames(vec![Frame::new(self.buffer, DEFAULT_DELAY_CS)], None)
    }

    pub fn write_to_memory(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let writer = BufWriter::new(Cursor::new(&mut buffer));
            let mut encoder = Encoder::new(writer, self.width, self.height);
            encoder.set_color(ColorType::Rgba);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(self.buffer.as_raw())?;
        }
        Ok(buffer)
    }
}
