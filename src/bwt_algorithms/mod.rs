//! The bwt_algorithms module undoes the Burrows-Wheeler Transform for bzcat.
//!
//! BZIP2 uses the Burrow-Wheeler Transform (BWT) to prepare data for compression, grouping bytes
//! that share a context so that runs are more likely. Reversing it needs only the transformed
//! block and the position of the original first rotation (the origin pointer).
//!
pub mod bwt_decode;
