//! Huffman table selection for a bzip2 block.
//!
//! A block carries 2 to 6 Huffman tables. The symbol stream is cut into groups of 50 symbols and
//! each group names the table that codes it through a selector. Selectors are sent as unary
//! move-to-front ranks, and each table as a 5-bit starting length followed by per-symbol deltas.

use std::io::Read;

use log::debug;

use super::huffman::{HuffmanTable, MAX_CODE_LEN};
use crate::bitstream::bitreader::BitReader;
use crate::error::{Corruption, Result};
use crate::tools::mtf::MoveToFront;

/// Number of symbols coded by each selector.
pub const GROUP_SIZE: usize = 50;
pub const MIN_TABLES: u32 = 2;
pub const MAX_TABLES: u32 = 6;

/// The Huffman tables of one block and the per-group choice between them.
#[derive(Debug, Clone)]
pub struct TableSelectors {
    tables: Vec<HuffmanTable>,
    selectors: Vec<u8>,
    next_selector: usize,
    /// Symbols left before the next selector takes over.
    group_left: usize,
    current: usize,
}

impl TableSelectors {
    /// Read table count, selectors and code-length tables for an alphabet of `alphabet_size`
    /// symbols (used byte values + RUNA/RUNB + EOB, less one since RUNA/RUNB replace rank 0).
    pub fn read<R: Read>(br: &mut BitReader<R>, alphabet_size: usize) -> Result<Self> {
        // Read NumTrees
        let table_count = br.bint(3)?;
        if !(MIN_TABLES..=MAX_TABLES).contains(&table_count) {
            return Err(br.corrupt(Corruption::TableCount(table_count)));
        }

        // Read NumSelectors
        let selector_count = br.bint(15)?;
        if selector_count == 0 {
            return Err(br.corrupt(Corruption::SelectorCount(selector_count)));
        }

        // Undo the move-to-front on the selectors as they come in
        let mut mtf = MoveToFront::new();
        let mut selectors = Vec::with_capacity(selector_count as usize);
        for _ in 0..selector_count {
            let rank = br.unary(table_count)?;
            if rank >= table_count {
                return Err(br.corrupt(Corruption::SelectorRank(rank)));
            }
            selectors.push(mtf.promote(rank as usize));
        }

        let mut tables = Vec::with_capacity(table_count as usize);
        for table in 0..table_count as usize {
            let lengths = read_code_lengths(br, table, alphabet_size)?;
            let huffman =
                HuffmanTable::new(&lengths).ok_or_else(|| br.corrupt(Corruption::InvalidCode))?;
            debug!(
                "Table {}: code lengths {}..={} at {}",
                table,
                huffman.min_len(),
                huffman.max_len(),
                br.loc()
            );
            tables.push(huffman);
        }

        debug!(
            "Decoded {} selectors for {} tables ({} symbols).",
            selector_count, table_count, alphabet_size
        );
        Ok(Self::new(tables, selectors))
    }

    /// Every selector must index into `tables`.
    pub(crate) fn new(tables: Vec<HuffmanTable>, selectors: Vec<u8>) -> Self {
        debug_assert!(selectors.iter().all(|&s| (s as usize) < tables.len()));
        Self {
            tables,
            selectors,
            next_selector: 0,
            group_left: 0,
            current: 0,
        }
    }

    /// Decode the next symbol, switching tables every 50 symbols.
    #[inline]
    pub fn next_symbol<R: Read>(&mut self, br: &mut BitReader<R>) -> Result<u16> {
        if self.group_left == 0 {
            let selector = *self
                .selectors
                .get(self.next_selector)
                .ok_or_else(|| br.corrupt(Corruption::SelectorsExhausted))?;
            self.current = selector as usize;
            self.next_selector += 1;
            self.group_left = GROUP_SIZE;
        }
        self.group_left -= 1;
        self.tables[self.current].decode(br)
    }
}

/// Read one table's code lengths: a 5-bit start, then for every symbol a run of
/// "10" (+1) / "11" (-1) adjustments closed by a single 0.
fn read_code_lengths<R: Read>(
    br: &mut BitReader<R>,
    table: usize,
    alphabet_size: usize,
) -> Result<Vec<u8>> {
    let mut length = br.bint(5)? as i32;
    let mut lengths = Vec::with_capacity(alphabet_size);
    for symbol in 0..alphabet_size {
        loop {
            if !(1..=MAX_CODE_LEN as i32).contains(&length) {
                return Err(br.corrupt(Corruption::CodeLength {
                    table,
                    symbol,
                    length,
                }));
            }
            if !br.bool_bit()? {
                break;
            }
            if br.bool_bit()? {
                length -= 1; // Found "11" - subtract 1
            } else {
                length += 1; // Found "10" - add 1
            }
        }
        lengths.push(length as u8);
    }
    Ok(lengths)
}
