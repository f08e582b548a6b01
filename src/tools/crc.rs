//! CRC32 checksums for bzip2, both block and stream versions.
//!
//! bzip2 uses the MSB-first ("big-endian") CRC-32 with polynomial 0x04C11DB7. This is *not*
//! the reflected table used by zlib, gzip and zip: the two agree on nothing except the empty input.

/// MSB-first CRC-32 lookup table (polynomial 0x04C11DB7), built at compile time.
pub const CRC32_TABLE: [u32; 256] = {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ 0x04C1_1DB7;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Running block CRC. Seeded with all ones, finalized by complement.
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    /// Fold one byte into the CRC.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.state = (self.state << 8) ^ CRC32_TABLE[((self.state >> 24) ^ byte as u32) as usize];
    }

    /// Fold a run of bytes into the CRC.
    pub fn update_slice(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Current CRC value. Does not reset the accumulator.
    pub fn finalize(&self) -> u32 {
        !self.state
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Block CRC of a complete slice of decoded data.
pub fn do_crc(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update_slice(data);
    crc.finalize()
}

/// Fold a block CRC into the running stream CRC.
pub fn do_stream_crc(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}
