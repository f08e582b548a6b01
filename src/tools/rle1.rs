/*
Logic: bzip2 collapses every run of 4 to 259 identical bytes into the first 4 bytes followed by a
count byte (0-255) of how many more copies to emit. Decoding watches the stream go by; after
4 identical bytes in a row, the next byte is not data but that count. Once the count is
consumed the run tracking starts over, so a fifth identical byte begins a new run of one.
*/

/// What to emit for one byte fed to the RLE1 decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rle1Step {
    /// Emit this byte once.
    Literal(u8),
    /// The fed byte was a count: emit `byte` `count` more times.
    Repeat { byte: u8, count: u8 },
}

/// Run-length state for undoing the RLE1 stage, one byte at a time.
#[derive(Debug, Clone, Default)]
pub struct Rle1Decoder {
    last: u8,
    run: u8,
}

impl Rle1Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next byte in BWT output order.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Rle1Step {
        if self.run == 4 {
            self.run = 0;
            return Rle1Step::Repeat {
                byte: self.last,
                count: byte,
            };
        }
        if self.run > 0 && byte == self.last {
            self.run += 1;
        } else {
            self.last = byte;
            self.run = 1;
        }
        Rle1Step::Literal(byte)
    }
}
