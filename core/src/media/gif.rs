use crate::{
    error::{Error, Result},
    media::{Frame, FrameSequence, MIN_DELAY_CS},
};

use image::{codecs::gif::GifDecoder, AnimationDecoder, ImageDecoder};

use std::io::{Cursor, Read, Seek, SeekFrom};

/// Decoding an animation beyond this many frames is refused outright; it is
/// the primary guard against unbounded work.
pub const MAX_FRAMES: usize = 200;

#[derive(Clone)]
pub struct Gif {
    pub frames: Vec<Frame>,
    pub width: u32,
    pub height: u32,
    pub loop_count: Option<u16>,
}

impl Gif {
    pub fn from_memory(gif_bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(gif_bytes);
        let (loop_count, frame_count) = Self::scan_metadata(&mut cursor)?;

        if frame_count > MAX_FRAMES {
            return Err(Error::InputTooLarge {
                frames: frame_count,
                limit: MAX_FRAMES,
            });
        }

        cursor.seek(SeekFrom::Start(0))?;
        let decoder = GifDecoder::new(cursor)?;
        let (width, height) = decoder.dimensions();

        let mut frames = Vec::with_capacity(frame_count);
        for decoded in decoder.into_frames().collect_frames()? {
            let (numerator, denominator) = decoded.delay().numer_denom_ms();
            let ms = numerator as f64 / denominator.max(1) as f64;
            let delay_cs = ((ms / 10.0).round() as u32).max(MIN_DELAY_CS);
            let (left, top) = (decoded.left(), decoded.top());
            let buffer = decoded.into_buffer();

            let buffer = if buffer.dimensions() == (width, height) {
                buffer
            } else {
                let mut canvas = image::RgbaImage::new(width, height);
                image::imageops::overlay(&mut canvas, &buffer, left as i64, top as i64);
                canvas
            };
            frames.push(Frame::new(buffer, delay_cs));
        }

        Ok(Self {
            frames,
            width,
            height,
            loop_count,
        })
    }

    pub fn into_sequence(self) -> FrameSequence {
        let mut sequence = FrameSequence::from_frames(self.frames, self.loop_count);
        sequence.normalize_canvas();
        sequence
    }

    /// Structural walk over the raw container: pulls the Netscape loop count
    /// and counts image descriptors without decoding any pixel data.
    fn scan_metadata<R: Read + Seek>(reader: &mut R) -> Result<(Option<u16>, usize)> {
        // Header is 6 bytes ("GIF87a" or "GIF89a")
        let mut header = [0u8; 6];
        reader.read_exact(&mut header)?;
        if &header[0..3] != b"GIF" {
            return Err(Error::InvalidGifFile);
        }

        // Logical screen descriptor, then the global color table if flagged
        let mut screen_desc = [0u8; 7];
        reader.read_exact(&mut screen_desc)?;
        let packed = screen_desc[4];
        if packed & 0x80 != 0 {
            let table_len = 3 * (2i64 << (packed & 0x07));
            reader.seek(SeekFrom::Current(table_len))?;
        }

        let mut loop_count = None;
        let mut frame_count = 0usize;

        let mut block_type = [0u8; 1];
        while reader.read_exact(&mut block_type).is_ok() {
            match block_type[0] {
                0x21 => {
                    // Extension introducer
                    let mut ext_label = [0u8; 1];
                    reader.read_exact(&mut ext_label)?;
                    let is_application_ext = ext_label[0] == 0xFF;
                    let mut is_netscape = false;
                    let mut app_id_seen = false;

                    let mut sub_block_size = [0u8; 1];
                    reader.read_exact(&mut sub_block_size)?;
                    while sub_block_size[0] != 0 {
                        let len = sub_block_size[0] as usize;
                        if is_application_ext && !app_id_seen && len == 11 {
                            let mut app_id = [0u8; 11];
                            reader.read_exact(&mut app_id)?;
                            app_id_seen = true;
                            is_netscape = &app_id == b"NETSCAPE2.0";
                        } else if is_netscape && len == 3 {
                            let mut data = [0u8; 3];
                            reader.read_exact(&mut data)?;
                            if data[0] == 1 {
                                loop_count = Some(u16::from_le_bytes([data[1], data[2]]));
                            }
                        } else {
                            reader.seek(SeekFrom::Current(len as i64))?;
                        }
                        reader.read_exact(&mut sub_block_size)?;
                    }
                }
                0x2C => {
                    // Image descriptor
                    frame_count += 1;

                    let mut descriptor = [0u8; 9];
                    reader.read_exact(&mut descriptor)?;
                    let packed = descriptor[8];
                    if packed & 0x80 != 0 {
                        let table_len = 3 * (2i64 << (packed & 0x07));
                        reader.seek(SeekFrom::Current(table_len))?;
                    }

                    // LZW minimum code size, then the data sub-blocks
                    reader.seek(SeekFrom::Current(1))?;
                    let mut sub_block_size = [0u8; 1];
                    reader.read_exact(&mut sub_block_size)?;
                    while sub_block_size[0] != 0 {
                        reader.seek(SeekFrom::Current(sub_block_size[0] as i64))?;
                        reader.read_exact(&mut sub_block_size)?;
                    }
                }
                0x3B => break,
                _ => break,
            }
        }

        Ok((loop_count, frame_count))
    }
}
