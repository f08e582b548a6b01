//! Decoding of a complete bzip2 stream: the `BZh` header, a sequence of blocks, and the footer
//! carrying the combined stream CRC.

use std::io::{self, Read, Write};

use log::{debug, info, trace, warn};

use super::block::{BlockDecoder, BlockReport, DecodedBlock};
use crate::bitstream::bitreader::BitReader;
use crate::error::{BzError, Corruption, Result};
use crate::tools::crc::do_stream_crc;

/// Marks the start of every block (BCD pi).
pub const BLOCK_MAGIC: u64 = 0x3141_5926_5359;
/// Marks the end of the stream (BCD sqrt(pi)).
pub const FOOTER_MAGIC: u64 = 0x1772_4538_5090;
const SIGNATURE: &[u8] = b"BZh";

/// Totals for a fully decoded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub blocks: Vec<BlockReport>,
    /// Stream CRC combined from the block CRCs.
    pub stream_crc: u32,
    /// Stream CRC stored in the footer.
    pub stored_crc: u32,
    pub output_len: u64,
}

impl StreamSummary {
    pub fn crc_ok(&self) -> bool {
        self.stream_crc == self.stored_crc
    }
}

/// Pull-based decoder for one bzip2 stream.
///
/// Blocks are decoded one at a time. Use [`decode_to`](Self::decode_to) to push everything into
/// a writer, or read from the decoder through its [`Read`] impl.
#[derive(Debug)]
pub struct StreamDecoder<R> {
    br: BitReader<R>,
    block: BlockDecoder,
    current: Option<DecodedBlock>,
    block_size: u8,
    stream_crc: u32,
    stored_crc: Option<u32>,
    blocks: Vec<BlockReport>,
    output_len: u64,
    strict: bool,
}

impl<R: Read> StreamDecoder<R> {
    /// Read and check the stream header.
    pub fn new(source: R) -> Result<Self> {
        let mut br = BitReader::new(source);

        // Look for a valid signature.
        if br.bytes(SIGNATURE.len())? != SIGNATURE {
            return Err(br.corrupt(Corruption::BadSignature));
        }
        let digit = br.byte()?;
        if !(b'1'..=b'9').contains(&digit) {
            return Err(br.corrupt(Corruption::BadBlockSize(digit)));
        }
        let block_size = digit - b'0';
        debug!("Found a valid bzip2 signature, block size {}00k.", block_size);

        Ok(Self {
            br,
            block: BlockDecoder::new(block_size),
            current: None,
            block_size,
            stream_crc: 0,
            stored_crc: None,
            blocks: Vec::new(),
            output_len: 0,
            strict: false,
        })
    }

    /// Fail on a stream CRC mismatch instead of logging a warning.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Block size digit from the header (1..=9).
    pub fn block_size(&self) -> u8 {
        self.block_size
    }

    /// True once the footer has been read and checked.
    pub fn is_finished(&self) -> bool {
        self.stored_crc.is_some()
    }

    /// Read the next block marker. Returns the next decoded block, or None at the footer.
    ///
    /// The caller must drain the block and pass it to [`finish_block`](Self::finish_block)
    /// before asking for another one.
    pub fn next_block(&mut self) -> Result<Option<DecodedBlock>> {
        if self.is_finished() {
            return Ok(None);
        }
        let magic = (self.br.bint(24)? as u64) << 24 | self.br.bint(24)? as u64;
        match magic {
            BLOCK_MAGIC => {
                let index = self.blocks.len() + 1;
                trace!("Found a valid header for block {} at {}.", index, self.br.loc());
                self.block.read_block(&mut self.br, index).map(Some)
            }
            FOOTER_MAGIC => {
                self.finish_stream()?;
                Ok(None)
            }
            other => Err(self.br.corrupt(Corruption::BadBlockMagic(other))),
        }
    }

    /// Verify a drained block, fold its CRC into the stream CRC, and recycle its buffers.
    pub fn finish_block(&mut self, block: DecodedBlock) -> Result<BlockReport> {
        debug_assert!(block.is_exhausted());
        let crc = block.verify()?;
        self.stream_crc = do_stream_crc(self.stream_crc, crc);
        info!(
            "Block {}: block CRC 0x{:08x}, stream CRC 0x{:08x}",
            block.index(),
            crc,
            self.stream_crc
        );
        let report = block.report();
        self.output_len += report.output_len;
        self.blocks.push(report.clone());
        self.block.recycle(block.recycle());
        Ok(report)
    }

    fn finish_stream(&mut self) -> Result<()> {
        let stored = self.br.read_u32()?;
        self.stored_crc = Some(stored);
        info!(
            "Stream CRC: stored 0x{:08x}, computed 0x{:08x} ({} blocks)",
            stored,
            self.stream_crc,
            self.blocks.len()
        );
        if stored != self.stream_crc {
            if self.strict {
                return Err(BzError::StreamCrcMismatch {
                    expected: stored,
                    actual: self.stream_crc,
                });
            }
            warn!(
                "Stream CRC mismatch: stored 0x{:08x}, computed 0x{:08x}",
                stored, self.stream_crc
            );
        }
        Ok(())
    }

    /// Decode every remaining block into `sink`.
    pub fn decode_to<W: Write>(&mut self, sink: &mut W) -> Result<StreamSummary> {
        if let Some(mut block) = self.current.take() {
            block.write_to(sink)?;
            self.finish_block(block)?;
        }
        while let Some(mut block) = self.next_block()? {
            block.write_to(sink)?;
            self.finish_block(block)?;
        }
        sink.flush()?;
        self.summary().ok_or(BzError::EndOfStream {
            bit_offset: self.br.bit_position(),
        })
    }

    /// Summary of the stream, once the footer has been read.
    pub fn summary(&self) -> Option<StreamSummary> {
        self.stored_crc.map(|stored_crc| StreamSummary {
            blocks: self.blocks.clone(),
            stream_crc: self.stream_crc,
            stored_crc,
            output_len: self.output_len,
        })
    }
}

impl<R: Read> Read for StreamDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let mut block = match self.current.take() {
                Some(block) => block,
                None => match self.next_block()? {
                    Some(block) => block,
                    None => return Ok(0),
                },
            };
            let n = block.read(buf);
            if n > 0 {
                // Put it back for the next call
                self.current = Some(block);
                return Ok(n);
            }
            self.finish_block(block)?;
        }
    }
}

/// Decompress a complete in-memory bzip2 stream.
pub fn decode_all(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    StreamDecoder::new(data)?.decode_to(&mut out)?;
    Ok(out)
}
