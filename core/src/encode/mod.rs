mod encoder;
mod lzw;
mod sink;

pub use encoder::GifEncoder;
pub use lzw::LzwCompressor;
pub use sink::ByteSink;
