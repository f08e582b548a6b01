//! bzcat: a bzip2 decompressor.
//!
//! Decodes bzip2 streams block by block: canonical Huffman decoding, MTF/RLE2 expansion,
//! inverse Burrows-Wheeler transform and RLE1 expansion, with every block CRC and the stream CRC
//! checked. Randomized blocks (a legacy encoder option) are rejected.
//!
//! Decompressing a buffer:
//!
//! ```no_run
//! let compressed = std::fs::read("notes.txt.bz2")?;
//! let text = bzcat::decode_all(&compressed)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Or stream through [`StreamDecoder`], which implements [`std::io::Read`].
//!
//! The binary works like `bunzip2`:
//!
//! `$> bzcat notes.txt.bz2`
//!
//! This will decompress the file and create the file notes.txt.
//! The compressed file will be deleted unless `-k` is given.
//!
pub mod bitstream;
pub mod bwt_algorithms;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::block::{BlockDecoder, BlockReport, DecodedBlock};
pub use compression::stream::{decode_all, StreamDecoder, StreamSummary};
pub use error::{BzError, Corruption, Result};
