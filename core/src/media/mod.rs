mod frame;
mod gif;
mod image;

pub use self::image::Image;
pub use frame::{Frame, FrameSequence, DEFAULT_DELAY_CS, MIN_DELAY_CS};
pub use gif::{Gif, MAX_FRAMES};

use ::image::{guess_format, ImageFormat};

use crate::error::{Error, Result};

#[derive(Clone)]
pub enum Media {
    Gif(Gif),
    Image(Image),
}

impl Media {
    pub fn from_memory(bytes: &[u8]) -> Result<Self> {
        let format = guess_format(bytes)?;
        match format {
            ImageFormat::Gif => Ok(Media::Gif(Gif::from_memory(bytes)?)),
            ImageFormat::Png => Ok(Media::Image(Image::from_memory(bytes)?)),
            _ => Err(Error::UnsupportedFormat),
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Media::Gif(_))
    }

    pub fn into_sequence(self) -> FrameSequence {
        match self {
            Media::Gif(gif) => gif.into_sequence(),
            Media::Image(image) => image.into_sequence(),
        }
    }

    pub fn default_extension(&self) -> &'static str {
        match self {
            Media::Gif(_) => "gif",
            Media::Image(_) => "png",
        }
    }
}
