//! A minimal MSB-first bit packer used to build bzip2 bitstreams by hand in tests.

/// Packs bits MSB-first into a byte vector.
pub struct BitWriter {
    /// Output buffer used to write the bitstream.
    output: Vec<u8>,
    /// Private queue to hold bits that are waiting to be put as bytes into the output buffer.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            queue: 0,
            q_bits: 0,
        }
    }

    /// Push the low `bits` bits of `value` (bits <= 32).
    pub fn out(&mut self, bits: u32, value: u32) {
        self.queue = (self.queue << bits) | (value as u64 & ((1_u64 << bits) - 1));
        self.q_bits += bits;
        while self.q_bits >= 8 {
            self.output.push((self.queue >> (self.q_bits - 8)) as u8);
            self.q_bits -= 8;
        }
        self.queue &= (1_u64 << self.q_bits) - 1;
    }

    pub fn out8(&mut self, byte: u8) {
        self.out(8, byte as u32)
    }

    pub fn out_bool(&mut self, bit: bool) {
        self.out(1, bit as u32)
    }

    /// Flush any partial byte, padding with zeros, and return the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.q_bits > 0 {
            let pad = 8 - self.q_bits;
            self.out(pad, 0);
        }
        self.output
    }
}

#[test]
fn packs_msb_first() {
    let mut bw = BitWriter::new();
    bw.out(3, 0b101);
    bw.out(24, 0x314159);
    bw.out_bool(true);
    bw.out8(0xAA);
    assert_eq!(bw.finish(), vec![0b1010_0110, 0x28, 0x2B, 0x3A, 0xA0]);
}
