//! Error types for bzip2 decompression.
//!
//! Every failure the decoder can hit is one of the [`BzError`] variants. None of them is
//! recoverable for the block (or stream) being decoded: bzip2 blocks are all-or-nothing, so
//! the error is handed straight back to the caller.
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`Io`] | The byte source or sink failed |
//! | [`EndOfStream`] | The input ended in the middle of a field |
//! | [`CorruptStream`] | A structural check failed (see [`Corruption`]) |
//! | [`UnsupportedFeature`] | Randomized blocks |
//! | [`BlockCrcMismatch`] | Decoded block disagrees with its stored CRC |
//! | [`StreamCrcMismatch`] | Combined stream CRC disagrees with the footer (strict mode only) |
//!
//! [`Io`]: BzError::Io
//! [`EndOfStream`]: BzError::EndOfStream
//! [`CorruptStream`]: BzError::CorruptStream
//! [`UnsupportedFeature`]: BzError::UnsupportedFeature
//! [`BlockCrcMismatch`]: BzError::BlockCrcMismatch
//! [`StreamCrcMismatch`]: BzError::StreamCrcMismatch

use std::fmt;
use std::io;

/// Error type for bzip2 decoding.
#[derive(Debug)]
pub enum BzError {
    /// An I/O error from the underlying reader or writer.
    Io(io::Error),

    /// The byte source ran dry before a field was complete. The stream is truncated.
    EndOfStream {
        /// Number of bits consumed when the input ran out.
        bit_offset: u64,
    },

    /// The stream violates the bzip2 format.
    CorruptStream {
        /// Bit position at which the problem was detected.
        bit_offset: u64,
        /// Which check failed.
        reason: Corruption,
    },

    /// The stream uses a legacy feature this decoder does not implement.
    UnsupportedFeature(&'static str),

    /// The CRC of a decoded block does not match the value stored in its header.
    BlockCrcMismatch {
        /// 1-based block number within the stream.
        block: usize,
        /// CRC stored in the block header.
        expected: u32,
        /// CRC of the bytes actually decoded.
        actual: u32,
    },

    /// The combined stream CRC does not match the footer.
    StreamCrcMismatch {
        /// CRC stored in the stream footer.
        expected: u32,
        /// CRC combined from the decoded blocks.
        actual: u32,
    },
}

/// The structural checks that can fail while parsing a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// The stream does not start with `BZh`.
    BadSignature,
    /// The block-size digit after `BZh` is not `'1'..='9'`.
    BadBlockSize(u8),
    /// Neither a block header nor the stream footer magic.
    BadBlockMagic(u64),
    /// The symbol map marks no byte values as used.
    NoSymbols,
    /// Huffman table count outside 2..=6.
    TableCount(u32),
    /// Zero selectors.
    SelectorCount(u32),
    /// A selector MTF rank is not below the table count.
    SelectorRank(u32),
    /// More symbol groups than selectors.
    SelectorsExhausted,
    /// A code length left the range 1..=20.
    CodeLength {
        table: usize,
        symbol: usize,
        length: i32,
    },
    /// No codeword of up to 20 bits matched.
    InvalidCode,
    /// The block decoded to more bytes than the stream's block size allows.
    BlockOverflow { limit: usize },
    /// The BWT origin pointer does not index into the decoded block.
    OriginPointer { origin: u32, length: usize },
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSignature => write!(f, "missing BZh signature"),
            Self::BadBlockSize(b) => write!(f, "invalid block size byte 0x{:02x}", b),
            Self::BadBlockMagic(m) => write!(f, "invalid block marker 0x{:012x}", m),
            Self::NoSymbols => write!(f, "block uses no symbols"),
            Self::TableCount(n) => write!(f, "invalid huffman table count {}", n),
            Self::SelectorCount(n) => write!(f, "invalid selector count {}", n),
            Self::SelectorRank(r) => write!(f, "selector rank {} out of range", r),
            Self::SelectorsExhausted => write!(f, "ran out of selectors before end of block"),
            Self::CodeLength {
                table,
                symbol,
                length,
            } => write!(
                f,
                "code length {} for symbol {} in table {} is outside 1..=20",
                length, symbol, table
            ),
            Self::InvalidCode => write!(f, "invalid huffman code"),
            Self::BlockOverflow { limit } => {
                write!(f, "block exceeds declared size of {} bytes", limit)
            }
            Self::OriginPointer { origin, length } => write!(
                f,
                "origin pointer {} outside block of {} bytes",
                origin, length
            ),
        }
    }
}

impl fmt::Display for BzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::EndOfStream { bit_offset } => write!(
                f,
                "unexpected end of compressed data at bit {}",
                bit_offset
            ),
            Self::CorruptStream { bit_offset, reason } => {
                write!(f, "corrupt stream at bit {}: {}", bit_offset, reason)
            }
            Self::UnsupportedFeature(what) => write!(f, "unsupported feature: {}", what),
            Self::BlockCrcMismatch {
                block,
                expected,
                actual,
            } => write!(
                f,
                "block {} CRC mismatch: stored 0x{:08x}, computed 0x{:08x}",
                block, expected, actual
            ),
            Self::StreamCrcMismatch { expected, actual } => write!(
                f,
                "stream CRC mismatch: stored 0x{:08x}, computed 0x{:08x}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for BzError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl BzError {
    /// True for errors caused by the compressed data itself rather than by I/O.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<io::Error> for BzError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BzError> for io::Error {
    fn from(e: BzError) -> Self {
        match e {
            BzError::Io(inner) => inner,
            BzError::EndOfStream { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, BzError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_names_the_failed_check() {
        let e = BzError::BlockCrcMismatch {
            block: 2,
            expected: 0xc1c080e2,
            actual: 0x12345678,
        };
        assert_eq!(
            e.to_string(),
            "block 2 CRC mismatch: stored 0xc1c080e2, computed 0x12345678"
        );

        let e = BzError::CorruptStream {
            bit_offset: 96,
            reason: Corruption::TableCount(7),
        };
        assert_eq!(
            e.to_string(),
            "corrupt stream at bit 96: invalid huffman table count 7"
        );
    }

    #[test]
    fn io_conversion_keeps_kind() {
        let eof: io::Error = BzError::EndOfStream { bit_offset: 8 }.into();
        assert_eq!(eof.kind(), io::ErrorKind::UnexpectedEof);

        let bad: io::Error = BzError::UnsupportedFeature("randomized blocks").into();
        assert_eq!(bad.kind(), io::ErrorKind::InvalidData);

        let inner = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let round: io::Error = BzError::from(inner).into();
        assert_eq!(round.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn only_io_is_not_a_data_error() {
        assert!(!BzError::Io(io::Error::new(io::ErrorKind::Other, "x")).is_data_error());
        assert!(BzError::UnsupportedFeature("x").is_data_error());
    }
}
