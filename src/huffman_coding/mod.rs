//! The huffman_coding module decodes the entropy-coded part of each bzip2 block.
//!
//! A block carries between two and six canonical Huffman tables, sent as code lengths only.
//! The symbol stream is cut into chunks of 50 symbols, and a selector per chunk names the table
//! it was coded with.
//!
//! The process of decoding each block is inherently sequential.
//!

pub mod huffman;
pub mod selectors;
