//! The bitstream module forms the input subsystem for the Rust version of the bzip2 decompressor.
//!
//! bzip2 packs every field MSB-first with no byte alignment between fields, so the decoder
//! reads through a bit cursor rather than byte by byte. Only the stream footer ends on a byte
//! boundary, and then only by zero padding.
//!
pub mod bitreader;
#[cfg(test)]
pub(crate) mod bitwriter;
