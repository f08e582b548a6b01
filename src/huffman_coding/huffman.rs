//! Canonical Huffman decoding tables.
//!
//! bzip2 only transmits a code length per symbol. The codes themselves are canonical: within
//! each length, codes are consecutive integers handed out in symbol order, and the first code of
//! each length follows on from the last code of the previous length. That means one `limit`
//! and one `base` per length are enough to decode: a code of length L with value V is valid
//! when `V <= limit[L]`, and its symbol is `symbols[V - base[L]]`.

use std::io::Read;

use crate::bitstream::bitreader::BitReader;
use crate::error::{Corruption, Result};

/// Longest code the bzip2 format allows.
pub const MAX_CODE_LEN: u32 = 20;

const LEN_SLOTS: usize = MAX_CODE_LEN as usize + 2;

/// Decode table for one canonical Huffman code.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Per length: first code of that length minus the number of shorter codes.
    base: [i32; LEN_SLOTS],
    /// Per length: largest code of that length (-1 if there are none).
    limit: [i32; LEN_SLOTS],
    /// Symbols sorted by (code length, symbol).
    symbols: Vec<u16>,
    min_len: u32,
    max_len: u32,
}

impl HuffmanTable {
    /// Build a table from one code length per symbol.
    ///
    /// Returns None if there are no symbols or a length is outside 1..=20. Kraft's inequality
    /// is not checked; an oversubscribed table can only produce decode errors later.
    pub fn new(lengths: &[u8]) -> Option<Self> {
        if lengths
            .iter()
            .any(|&len| len == 0 || len as u32 > MAX_CODE_LEN)
        {
            return None;
        }
        let min_len = *lengths.iter().min()? as u32;
        let max_len = *lengths.iter().max()? as u32;

        // Count symbols per length one slot up, then prefix-sum so that
        // shorter[len] is the number of symbols with a code shorter than len.
        let mut shorter = [0_i32; LEN_SLOTS + 1];
        for &len in lengths {
            shorter[len as usize + 1] += 1;
        }
        for i in 1..shorter.len() {
            shorter[i] += shorter[i - 1];
        }

        let mut base = [0_i32; LEN_SLOTS];
        let mut limit = [-1_i32; LEN_SLOTS];
        let mut code = 0_i32;
        for len in min_len as usize..=max_len as usize {
            let count = shorter[len + 1] - shorter[len];
            base[len] = code - shorter[len];
            limit[len] = code + count - 1;
            code = (code + count) << 1;
        }

        let mut symbols = Vec::with_capacity(lengths.len());
        for len in min_len..=max_len {
            for (symbol, _) in lengths
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l as u32 == len)
            {
                symbols.push(symbol as u16);
            }
        }

        Some(Self {
            base,
            limit,
            symbols,
            min_len,
            max_len,
        })
    }

    /// Read one codeword and return its symbol.
    pub fn decode<R: Read>(&self, br: &mut BitReader<R>) -> Result<u16> {
        let mut len = self.min_len;
        let mut code = br.bint(len)? as i32;
        loop {
            if code <= self.limit[len as usize] {
                let index = code - self.base[len as usize];
                return usize::try_from(index)
                    .ok()
                    .and_then(|i| self.symbols.get(i))
                    .copied()
                    .ok_or_else(|| br.corrupt(Corruption::InvalidCode));
            }
            if len >= self.max_len {
                return Err(br.corrupt(Corruption::InvalidCode));
            }
            code = (code << 1) | br.bit()? as i32;
            len += 1;
        }
    }

    pub fn min_len(&self) -> u32 {
        self.min_len
    }

    pub fn max_len(&self) -> u32 {
        self.max_len
    }
}
