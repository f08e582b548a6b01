use std::io::Read;

use log::trace;

use crate::bitstream::bitreader::BitReader;
use crate::error::{Corruption, Result};

const BIT_MASK: u16 = 0x8000;

/// Read the two-level symbol bitmap at the start of a block body and return the
/// byte values it marks as used, in ascending order.
pub fn read_symbol_map<R: Read>(br: &mut BitReader<R>) -> Result<Vec<u8>> {
    // First the "index" of which 16-byte ranges are present...
    let mut sym_map: Vec<u16> = vec![br.bint(16)? as u16];
    // ...then one 16-bit map for each range that is
    for _ in 0..sym_map[0].count_ones() {
        sym_map.push(br.bint(16)? as u16);
    }
    for map in &sym_map {
        trace!("\r\x1b[43m{:0>16b}     \x1b[0m", map);
    }

    let symbols = decode_sym_map(&sym_map);
    if symbols.is_empty() {
        return Err(br.corrupt(Corruption::NoSymbols));
    }
    Ok(symbols)
}

/// Takes the unique bzip2 symbol map and returns a sorted vec of all
/// u8s used in the block.
pub fn decode_sym_map(symbol_map: &[u16]) -> Vec<u8> {
    /*
    symbol_map[0] is a map of the presense/absense of blocks of u8s in the input data.
    For example, if the first bit of maps[0] is a zero, then none of the u8s from 0-15 were
    present in the input file, AND there would be no u16 needed to mark any of those.
    If the second bit of maps[0] is a one, then at least one u8 from the range of 16-31 was present
    in the input. That means the next u16 would be a bit map for this block of u8s with 1s and 0s
    indicating the presence / absense of those u8s. Etc.
    */
    let mut symbols: Vec<u8> = Vec::with_capacity(256);
    // Set a counter for the number of maps
    let mut map_idx = 0;

    for block in 0..16_u8 {
        // Check the index to see if the next bit has a block of bytes
        if (symbol_map[0] & (BIT_MASK >> block)) > 0 {
            // Found one, so increment the index to the correct symbol map offset
            map_idx += 1;
            let Some(&map) = symbol_map.get(map_idx) else {
                break;
            };
            // Within that u16, iterate to find which bytes were present
            for byte_idx in 0..16_u8 {
                if (map & (BIT_MASK >> byte_idx)) > 0 {
                    // block * 16 + byte_idx = u8 value we found
                    symbols.push((block << 4) + byte_idx);
                };
            }
        }
    }
    symbols
}
