/// Chunking module - Gateway
mod splitter;

pub use splitter::{char_len, join_chunks, split};
