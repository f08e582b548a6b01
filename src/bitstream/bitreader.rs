//! BitReader: A module for the Rust version of the bzip2 decompressor.
//!
//! Reads a packed bitstream MSB-first for the block-oriented deconstruction of bzip2 compressed files.
//!
//! NOTE: This module can read from any I/O source that supports the read() call.
//!
use std::io::{self, Read};

use crate::error::{BzError, Corruption, Result};

const BUFFER_SIZE: usize = 64 * 1024;

/// Reads a binary bzip2 stream bit by bit.
#[derive(Debug)]
pub struct BitReader<R> {
    buffer: Vec<u8>,
    cursor: usize,
    filled: usize,
    /// Bits not yet handed out. Only the low `bit_count` bits are meaningful.
    bit_buf: u64,
    bit_count: u32,
    bytes_read: u64,
    source: R,
}

impl<R: Read> BitReader<R> {
    /// Creates a new BitReader (with a 64k byte buffer).
    pub fn new(source: R) -> Self {
        Self {
            buffer: vec![0; BUFFER_SIZE],
            cursor: 0,
            filled: 0,
            bit_buf: 0,
            bit_count: 0,
            bytes_read: 0,
            source,
        }
    }

    /// Check (and refill) buffer. Returns true if we have data, false if there is no more.
    fn have_data(&mut self) -> Result<bool> {
        // Only try to read more data once every buffered byte has been taken
        if self.cursor == self.filled {
            let size = loop {
                match self.source.read(&mut self.buffer) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            if size == 0 {
                return Ok(false);
            }
            self.filled = size;
            self.cursor = 0;
        }
        Ok(true)
    }

    /// Pull whole bytes into the bit buffer until at least n bits are held.
    fn refill(&mut self, n: u32) -> Result<()> {
        while self.bit_count < n {
            if !self.have_data()? {
                return Err(BzError::EndOfStream {
                    bit_offset: self.bit_position(),
                });
            }
            self.bit_buf = (self.bit_buf << 8) | self.buffer[self.cursor] as u64;
            self.cursor += 1;
            self.bytes_read += 1;
            self.bit_count += 8;
        }
        Ok(())
    }

    /// Return the next n bits (1..=32) as a u32, first bit in the most significant position.
    pub fn bint(&mut self, n: u32) -> Result<u32> {
        debug_assert!((1..=32).contains(&n), "bint reads 1 to 32 bits, not {}", n);
        self.refill(n)?;
        self.bit_count -= n;
        let value = (self.bit_buf >> self.bit_count) & ((1_u64 << n) - 1);
        // Drop the bits we just handed out
        self.bit_buf &= (1_u64 << self.bit_count) - 1;
        Ok(value as u32)
    }

    /// Return the next bit (1 or 0).
    pub fn bit(&mut self) -> Result<u32> {
        self.bint(1)
    }

    /// Return *true* if the next bit is 1, *false* if 0, consuming the bit.
    pub fn bool_bit(&mut self) -> Result<bool> {
        self.bit().map(|bit| bit == 1)
    }

    /// Count consecutive 1-bits up to and including the terminating 0-bit.
    ///
    /// Stops early, without consuming anything further, once `max` ones have been seen.
    /// Callers pass the first value that is already invalid so runaway input fails fast.
    pub fn unary(&mut self, max: u32) -> Result<u32> {
        let mut count = 0;
        while count < max && self.bool_bit()? {
            count += 1;
        }
        Ok(count)
    }

    /// Read a 32-bit big-endian field as two 16-bit halves.
    pub fn read_u32(&mut self) -> Result<u32> {
        let high = self.bint(16)?;
        let low = self.bint(16)?;
        Ok(high << 16 | low)
    }

    /// Returns a byte. This is a convenience function, and calls bint(8).
    pub fn byte(&mut self) -> Result<u8> {
        self.bint(8).map(|byte| byte as u8)
    }

    /// Returns a Vec<u8> of n bytes. This is a convenience function, and calls byte n times.
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        (0..n).map(|_| self.byte()).collect()
    }

    /// Number of bits consumed so far.
    pub fn bit_position(&self) -> u64 {
        self.bytes_read * 8 - self.bit_count as u64
    }

    /// Build a corruption error stamped with the current position.
    pub fn corrupt(&self, reason: Corruption) -> BzError {
        BzError::CorruptStream {
            bit_offset: self.bit_position(),
            reason,
        }
    }

    /// Debugging function. Report current position as [byte.bit].
    pub fn loc(&self) -> String {
        let pos = self.bit_position();
        format!("[{}.{}]", pos / 8, pos % 8)
    }
}
