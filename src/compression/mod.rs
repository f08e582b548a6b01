//! The compression module manages the decompression side of bzcat.
//!
//! Decompression follows the inverse of the bzip2 compression process, one block at a time:
//! - Huffman decoding, switching between up to six tables every 50 symbols.
//! - RLE 2: Expand all runs of the zero MTF index (RUNA/RUNB).
//! - MTF transform: Convert from the Move-To-Front indices to the byte values they stand for.
//! - BWT reversal: Restore the original order with a bucket-sorted linked walk.
//! - RLE 1: Expand all runs of 4+ identical bytes, checking the block CRC as bytes go out.
//!
//! `block` handles one block, `stream` the header, block sequence and stream CRC, and
//! `decompress` the files named on the command line.
//!

pub mod block;
pub mod decompress;
pub mod stream;
