//! The tools module provides several helper functions for bzcat.
//!
//! The tools are:
//! - cli: Command line interface.
//! - crc: CRC32 checksum for BZIP2, both block and stream versions.
//! - mtf: Move-To-Front state for decoding.
//! - rle1: Run-Length-Encoding phase 1 expansion.
//! - symbol_map: Decode the symbol map used in BZIP2.
//!
pub mod cli;
pub mod crc;
pub mod mtf;
pub mod rle1;
pub mod symbol_map;
