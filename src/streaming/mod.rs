pub mod decoder;

pub use decoder::SseDecoder;
