//! Decoding of a single bzip2 block.
//!
//! A block goes through a fixed sequence of stages:
//!
//! `ReadHeader → ReadSymbolMap → ReadTables → DecodeMtfRle2 → BuildBucketArray → EmitRle1Decoded → Done`
//!
//! [`BlockDecoder::read_block`] runs everything up to and including the bucket array and hands
//! back a [`DecodedBlock`]. The decoded block is then drained (all at once with
//! [`DecodedBlock::write_to`], or piecemeal with [`DecodedBlock::read`]) and finally checked
//! against its stored CRC with [`DecodedBlock::verify`].

use std::io::{Read, Write};

use log::{debug, trace};

use crate::bitstream::bitreader::BitReader;
use crate::bwt_algorithms::bwt_decode::{build_bucket_array, BwtWalk};
use crate::error::{BzError, Corruption, Result};
use crate::huffman_coding::selectors::TableSelectors;
use crate::tools::crc::Crc32;
use crate::tools::mtf::MoveToFront;
use crate::tools::rle1::{Rle1Decoder, Rle1Step};
use crate::tools::symbol_map::read_symbol_map;

const RUNA: u16 = 0;
const RUNB: u16 = 1;
const WRITE_CHUNK: usize = 64 * 1024;

/// Where a block decode has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadHeader,
    ReadSymbolMap,
    ReadTables,
    DecodeMtfRle2,
    BuildBucketArray,
    EmitRle1Decoded,
    Done,
}

/// What one fully decoded block looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    /// 1-based block number within the stream.
    pub index: usize,
    /// Verified block CRC.
    pub crc: u32,
    /// Bytes in the block before RLE1 expansion.
    pub bwt_len: usize,
    /// Bytes written out after RLE1 expansion.
    pub output_len: u64,
}

/// Reusable state for decoding the blocks of one stream.
///
/// The BWT buffer, histogram and bucket array live here and are reused from block to block.
#[derive(Debug)]
pub struct BlockDecoder {
    max_len: usize,
    bwt: Vec<u8>,
    counts: [u32; 256],
    bucket: Vec<u32>,
    stage: Stage,
    index: usize,
}

impl BlockDecoder {
    /// Decoder for a stream with the given block size digit (1..=9).
    pub fn new(block_size_100k: u8) -> Self {
        debug_assert!((1..=9).contains(&block_size_100k));
        Self {
            max_len: block_size_100k as usize * 100_000,
            bwt: Vec::new(),
            counts: [0; 256],
            bucket: Vec::new(),
            stage: Stage::Done,
            index: 0,
        }
    }

    /// Largest pre-RLE1 block this decoder accepts.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Stage reached by the most recent `read_block` call.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        trace!("Block {}: {:?} -> {:?}", self.index, self.stage, stage);
        self.stage = stage;
    }

    /// Read one block body (everything after the block magic) and prepare its output.
    pub fn read_block<R: Read>(
        &mut self,
        br: &mut BitReader<R>,
        index: usize,
    ) -> Result<DecodedBlock> {
        self.index = index;
        self.enter(Stage::ReadHeader);
        let expected_crc = br.read_u32()?;
        if br.bool_bit()? {
            return Err(BzError::UnsupportedFeature("randomized blocks"));
        }
        let origin = br.bint(24)?;
        debug!(
            "Block {}: stored CRC 0x{:08x}, origin {} at {}",
            index,
            expected_crc,
            origin,
            br.loc()
        );

        self.enter(Stage::ReadSymbolMap);
        let symbol_map = read_symbol_map(br)?;
        debug!("Found {} symbols for block {}.", symbol_map.len(), index);

        self.enter(Stage::ReadTables);
        // RUNA and RUNB stand in for rank 0, and EOB closes the alphabet
        let mut selectors = TableSelectors::read(br, symbol_map.len() + 2)?;

        self.enter(Stage::DecodeMtfRle2);
        self.decode_symbols(br, &mut selectors, &symbol_map)?;
        debug!("Block {}: {} bytes before RLE1", index, self.bwt.len());
        if origin as usize >= self.bwt.len() {
            return Err(br.corrupt(Corruption::OriginPointer {
                origin,
                length: self.bwt.len(),
            }));
        }

        self.enter(Stage::BuildBucketArray);
        let mut bucket = std::mem::take(&mut self.bucket);
        build_bucket_array(&self.bwt, &self.counts, &mut bucket);
        let walk = BwtWalk::new(bucket, origin).ok_or_else(|| {
            br.corrupt(Corruption::OriginPointer {
                origin,
                length: self.bwt.len(),
            })
        })?;

        self.enter(Stage::EmitRle1Decoded);
        Ok(DecodedBlock {
            walk,
            rle1: Rle1Decoder::new(),
            repeat: 0,
            repeat_byte: 0,
            crc: Crc32::new(),
            expected_crc,
            index,
            bwt_len: self.bwt.len(),
            emitted: 0,
        })
    }

    /// Undo Huffman coding, RLE2 and the MTF transform into the BWT buffer, counting byte values
    /// as they go by.
    fn decode_symbols<R: Read>(
        &mut self,
        br: &mut BitReader<R>,
        selectors: &mut TableSelectors,
        symbol_map: &[u8],
    ) -> Result<()> {
        self.bwt.clear();
        self.counts = [0; 256];
        let eob = symbol_map.len() as u16 + 1;
        let mut mtf = MoveToFront::new();
        let mut run = 0_usize;
        let mut run_bit = 1_usize;

        loop {
            let symbol = selectors.next_symbol(br)?;
            if symbol == RUNA || symbol == RUNB {
                // Bijective base 2: RUNA adds the current digit, RUNB adds it twice
                run += run_bit << symbol;
                run_bit <<= 1;
                if run > self.max_len {
                    return Err(self.overflow(br));
                }
                continue;
            }

            if run > 0 {
                if self.bwt.len() + run > self.max_len {
                    return Err(self.overflow(br));
                }
                let byte = symbol_map[mtf.front() as usize];
                self.counts[byte as usize] += run as u32;
                self.bwt.resize(self.bwt.len() + run, byte);
                run = 0;
                run_bit = 1;
            }

            if symbol == eob {
                return Ok(());
            }

            if self.bwt.len() >= self.max_len {
                return Err(self.overflow(br));
            }
            // MTF positions below the symbol count only ever hold indexes into symbol_map
            let byte = symbol_map[mtf.promote(symbol as usize - 1) as usize];
            self.counts[byte as usize] += 1;
            self.bwt.push(byte);
        }
    }

    fn overflow<R: Read>(&self, br: &BitReader<R>) -> BzError {
        br.corrupt(Corruption::BlockOverflow {
            limit: self.max_len,
        })
    }

    /// Take back the bucket array of a finished block for the next one.
    pub fn recycle(&mut self, bucket: Vec<u32>) {
        if bucket.capacity() > self.bucket.capacity() {
            self.bucket = bucket;
        }
        self.enter(Stage::Done);
    }

    /// Read, emit and verify a whole block in one go.
    pub fn decode<R: Read, W: Write>(
        &mut self,
        br: &mut BitReader<R>,
        index: usize,
        sink: &mut W,
    ) -> Result<BlockReport> {
        let mut block = self.read_block(br, index)?;
        block.write_to(sink)?;
        block.verify()?;
        let report = block.report();
        self.recycle(block.recycle());
        Ok(report)
    }
}

/// A block whose BWT has been undone, ready to hand out its decoded bytes.
#[derive(Debug)]
pub struct DecodedBlock {
    walk: BwtWalk,
    rle1: Rle1Decoder,
    /// Copies of `repeat_byte` still owed from an RLE1 count.
    repeat: usize,
    repeat_byte: u8,
    crc: Crc32,
    expected_crc: u32,
    index: usize,
    bwt_len: usize,
    emitted: u64,
}

impl DecodedBlock {
    /// Fill `buf` with decoded bytes. Returns 0 once the block is exhausted.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            if self.repeat > 0 {
                let take = self.repeat.min(buf.len() - n);
                for slot in &mut buf[n..n + take] {
                    *slot = self.repeat_byte;
                    self.crc.update(self.repeat_byte);
                }
                self.repeat -= take;
                n += take;
                continue;
            }
            match self.walk.next() {
                None => break,
                Some(byte) => match self.rle1.push(byte) {
                    Rle1Step::Literal(b) => {
                        buf[n] = b;
                        self.crc.update(b);
                        n += 1;
                    }
                    Rle1Step::Repeat { byte, count } => {
                        self.repeat = count as usize;
                        self.repeat_byte = byte;
                    }
                },
            }
        }
        self.emitted += n as u64;
        n
    }

    /// Drain the rest of the block into `sink`. Returns the number of bytes written.
    pub fn write_to<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
        let mut chunk = vec![0_u8; WRITE_CHUNK.min(self.walk.remaining() + 255).max(1)];
        let mut written = 0;
        loop {
            let n = self.read(&mut chunk);
            if n == 0 {
                return Ok(written);
            }
            sink.write_all(&chunk[..n])?;
            written += n as u64;
        }
    }

    /// True once every decoded byte has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.repeat == 0 && self.walk.remaining() == 0
    }

    /// Compare the CRC of everything emitted with the stored block CRC.
    ///
    /// Only meaningful once the block is exhausted.
    pub fn verify(&self) -> Result<u32> {
        let actual = self.crc.finalize();
        debug!(
            "Block {} CRC: stored 0x{:08x}, computed 0x{:08x}",
            self.index, self.expected_crc, actual
        );
        if actual != self.expected_crc {
            return Err(BzError::BlockCrcMismatch {
                block: self.index,
                expected: self.expected_crc,
                actual,
            });
        }
        Ok(actual)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn report(&self) -> BlockReport {
        BlockReport {
            index: self.index,
            crc: self.crc.finalize(),
            bwt_len: self.bwt_len,
            output_len: self.emitted,
        }
    }

    /// Give up the bucket array so the decoder can reuse it.
    pub fn recycle(self) -> Vec<u32> {
        self.walk.into_bucket()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::bitstream::bitwriter::BitWriter;
    use crate::bwt_algorithms::bwt_decode::test::bwt_encode;
    use crate::huffman_coding::selectors::test::{write_lengths, write_selectors};
    use crate::huffman_coding::selectors::GROUP_SIZE;
    use crate::tools::crc::do_crc;

    /// RLE1-encode a block the way the compressor does.
    fn rle1_encode(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let byte = data[i];
            let mut run = 1;
            while i + run < data.len() && data[i + run] == byte && run < 259 {
                run += 1;
            }
            if run >= 4 {
                out.extend_from_slice(&[byte; 4]);
                out.push((run - 4) as u8);
            } else {
                out.extend(std::iter::repeat(byte).take(run));
            }
            i += run;
        }
        out
    }

    /// MTF + RLE2 encode into symbols (RUNA = 0, RUNB = 1, EOB = used + 1).
    fn mtf_rle2_encode(bwt: &[u8], used: &[u8]) -> Vec<u16> {
        let mut order = used.to_vec();
        let mut symbols = Vec::new();
        let mut zeros = 0_usize;
        let flush = |zeros: &mut usize, symbols: &mut Vec<u16>| {
            // Bijective base 2, least significant digit first
            while *zeros > 0 {
                if *zeros & 1 == 1 {
                    symbols.push(RUNA);
                    *zeros = (*zeros - 1) / 2;
                } else {
                    symbols.push(RUNB);
                    *zeros = (*zeros - 2) / 2;
                }
            }
        };
        for &b in bwt {
            let rank = order.iter().position(|&x| x == b).unwrap();
            if rank == 0 {
                zeros += 1;
                continue;
            }
            flush(&mut zeros, &mut symbols);
            order.remove(rank);
            order.insert(0, b);
            symbols.push(rank as u16 + 1);
        }
        flush(&mut zeros, &mut symbols);
        symbols.push(used.len() as u16 + 1);
        symbols
    }

    /// Build a complete block body (no block magic) with flat-length Huffman tables.
    pub(crate) fn encode_block(data: &[u8]) -> Vec<u8> {
        let mut bw = BitWriter::new();
        write_block(&mut bw, data);
        bw.finish()
    }

    pub(crate) fn write_block(bw: &mut BitWriter, data: &[u8]) {
        let pre = rle1_encode(data);
        let (origin, bwt) = bwt_encode(&pre);
        let mut used: Vec<u8> = pre.clone();
        used.sort_unstable();
        used.dedup();
        let symbols = mtf_rle2_encode(&bwt, &used);
        let alphabet = used.len() + 2;
        let len = (usize::BITS - (alphabet - 1).leading_zeros()).max(1);

        bw.out(32, do_crc(data));
        bw.out_bool(false);
        bw.out(24, origin);

        let mut ranges = 0_u16;
        let mut maps = [0_u16; 16];
        for &b in &used {
            ranges |= 0x8000 >> (b >> 4);
            maps[(b >> 4) as usize] |= 0x8000 >> (b & 15);
        }
        bw.out(16, ranges as u32);
        for (i, &m) in maps.iter().enumerate() {
            if ranges & (0x8000 >> i) != 0 {
                bw.out(16, m as u32);
            }
        }

        let groups = (symbols.len() + GROUP_SIZE - 1) / GROUP_SIZE;
        bw.out(3, 2);
        bw.out(15, groups as u32);
        // Alternate between the two (identical) tables
        let selectors: Vec<u8> = (0..groups).map(|g| (g % 2) as u8).collect();
        write_selectors(bw, &selectors);
        for _ in 0..2 {
            write_lengths(bw, &vec![len as u8; alphabet]);
        }
        for &s in &symbols {
            bw.out(len, s as u32);
        }
    }

    fn decode(data: &[u8], block_size: u8) -> Result<(Vec<u8>, BlockReport)> {
        let body = encode_block(data);
        let mut br = BitReader::new(body.as_slice());
        let mut decoder = BlockDecoder::new(block_size);
        let mut out = Vec::new();
        let report = decoder.decode(&mut br, 1, &mut out)?;
        assert_eq!(decoder.stage(), Stage::Done);
        Ok((out, report))
    }

    #[test]
    fn decodes_hand_built_blocks() {
        let samples: [&[u8]; 5] = [
            b"hello\n",
            b"banana",
            b"Goofy teeeeeeeest",
            b"x",
            b"abababababababababababababababab ccccccccc",
        ];
        for data in samples {
            let (out, report) = decode(data, 1).unwrap();
            assert_eq!(out, data.to_vec());
            assert_eq!(report.crc, do_crc(data));
            assert_eq!(report.output_len, data.len() as u64);
        }
    }

    #[test]
    fn long_runs_expand_through_rle1_and_rle2() {
        // 1000 copies of one byte: RLE1 gives groups of 4 + count, RLE2 collapses the zero ranks
        let data = vec![b'a'; 1000];
        let (out, report) = decode(&data, 1).unwrap();
        assert_eq!(out, data);
        assert_eq!(report.bwt_len, 1000 / 259 * 5 + 5);
    }

    #[test]
    fn every_byte_value() {
        let data: Vec<u8> = (0..=255).chain((0..=255).rev()).collect();
        let (out, _) = decode(&data, 1).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn piecewise_read_matches_write_to() {
        let data = b"Goofy teeeeeeeeeeeeeeeeeeeeeeest of the piecewise reader";
        let body = encode_block(data);
        let mut br = BitReader::new(body.as_slice());
        let mut decoder = BlockDecoder::new(1);
        let mut block = decoder.read_block(&mut br, 1).unwrap();
        assert_eq!(decoder.stage(), Stage::EmitRle1Decoded);
        let mut out = Vec::new();
        let mut buf = [0_u8; 3];
        loop {
            let n = block.read(&mut buf);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert!(block.is_exhausted());
        assert_eq!(out, data.to_vec());
        assert_eq!(block.verify().unwrap(), do_crc(data));
    }

    #[test]
    fn randomized_block_is_unsupported() {
        let mut bw = BitWriter::new();
        bw.out(32, 0);
        bw.out_bool(true);
        bw.out(24, 0);
        let data = bw.finish();
        let mut br = BitReader::new(data.as_slice());
        assert!(matches!(
            BlockDecoder::new(1).read_block(&mut br, 1),
            Err(BzError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn wrong_crc_is_reported() {
        let mut body = encode_block(b"hello\n");
        body[0] ^= 0x80;
        let mut br = BitReader::new(body.as_slice());
        let mut out = Vec::new();
        match BlockDecoder::new(1).decode(&mut br, 4, &mut out) {
            Err(BzError::BlockCrcMismatch {
                block,
                expected,
                actual,
            }) => {
                assert_eq!(block, 4);
                assert_eq!(actual, do_crc(b"hello\n"));
                assert_eq!(expected, actual ^ 0x8000_0000);
            }
            other => panic!("expected a CRC mismatch, got {:?}", other),
        }
    }

    #[test]
    fn origin_past_end_of_block() {
        let mut bw = BitWriter::new();
        bw.out(32, 0);
        bw.out_bool(false);
        bw.out(24, 6);
        // Only 'a' used
        bw.out(16, 0x8000 >> 6);
        bw.out(16, 0x8000 >> 1);
        bw.out(3, 2);
        bw.out(15, 1);
        write_selectors(&mut bw, &[0]);
        // One byte value in use: the alphabet is just RUNA, RUNB and EOB
        write_lengths(&mut bw, &[2, 2, 2]);
        write_lengths(&mut bw, &[2, 2, 2]);
        // 'a' via a rank 0 run of 1 (RUNA = 00), then EOB (10)
        bw.out(2, 0);
        bw.out(2, 2);
        let data = bw.finish();
        let mut br = BitReader::new(data.as_slice());
        assert!(matches!(
            BlockDecoder::new(1).read_block(&mut br, 1),
            Err(BzError::CorruptStream {
                reason: Corruption::OriginPointer {
                    origin: 6,
                    length: 1
                },
                ..
            })
        ));
    }

    #[test]
    fn run_past_block_size() {
        let mut bw = BitWriter::new();
        bw.out(32, 0);
        bw.out_bool(false);
        bw.out(24, 0);
        bw.out(16, 0x8000 >> 6);
        bw.out(16, 0x8000 >> 1);
        bw.out(3, 2);
        bw.out(15, 1);
        write_selectors(&mut bw, &[0]);
        write_lengths(&mut bw, &[2, 2, 2]);
        write_lengths(&mut bw, &[2, 2, 2]);
        // 17 RUNBs: a run of 2^18 - 2 bytes, more than the 100k limit
        for _ in 0..17 {
            bw.out(2, 1);
        }
        bw.out(2, 2);
        let data = bw.finish();
        let mut br = BitReader::new(data.as_slice());
        assert!(matches!(
            BlockDecoder::new(1).read_block(&mut br, 1),
            Err(BzError::CorruptStream {
                reason: Corruption::BlockOverflow { limit: 100_000 },
                ..
            })
        ));
    }

    #[test]
    fn bucket_is_reused_across_blocks() {
        let mut bw = BitWriter::new();
        write_block(&mut bw, b"first block of text");
        write_block(&mut bw, b"second");
        let data = bw.finish();
        let mut br = BitReader::new(data.as_slice());
        let mut decoder = BlockDecoder::new(1);
        let mut out = Vec::new();
        decoder.decode(&mut br, 1, &mut out).unwrap();
        let capacity = decoder.bucket.capacity();
        assert!(capacity >= 19);
        decoder.decode(&mut br, 2, &mut out).unwrap();
        assert_eq!(decoder.bucket.capacity(), capacity);
        assert_eq!(out, b"first block of textsecond".to_vec());
    }
}
