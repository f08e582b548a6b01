//! Burrows-Wheeler-Transform inversion.
//!
//! The decoder never rebuilds the original block in a separate buffer. Instead it builds one
//! "next pointer" array with a stable counting sort and walks it as a linked list: each entry
//! packs the position of the next entry in its high 24 bits and the byte it stands for in the
//! low 8 bits.

/// Build the linked bucket array for `bwt`.
///
/// `counts` must hold the number of occurrences of every byte value in `bwt`. `bucket` is
/// cleared and refilled, so a buffer from an earlier block can be passed back in.
pub fn build_bucket_array(bwt: &[u8], counts: &[u32; 256], bucket: &mut Vec<u32>) {
    debug_assert_eq!(
        counts.iter().map(|&c| c as usize).sum::<usize>(),
        bwt.len()
    );
    debug_assert!(bwt.len() < 1 << 24);

    // Convert frequency count to a cumulative sum of frequencies (exclusive)
    let mut base = [0_u32; 256];
    let mut sum = 0;
    for (b, &count) in base.iter_mut().zip(counts.iter()) {
        *b = sum;
        sum += count;
    }

    bucket.clear();
    bucket.resize(bwt.len(), 0);
    for (i, &v) in bwt.iter().enumerate() {
        let slot = &mut base[v as usize];
        bucket[*slot as usize] = (i as u32) << 8 | v as u32;
        *slot += 1;
    }
}

/// Iterator over the original (pre-BWT) bytes of a block.
#[derive(Debug)]
pub struct BwtWalk {
    bucket: Vec<u32>,
    ptr: u32,
    remaining: usize,
}

impl BwtWalk {
    /// Start the walk at `origin`. Returns None if `origin` does not index into the block; an
    /// empty block only accepts origin 0.
    pub fn new(bucket: Vec<u32>, origin: u32) -> Option<Self> {
        let remaining = bucket.len();
        let ptr = if remaining == 0 && origin == 0 {
            0
        } else {
            *bucket.get(origin as usize)?
        };
        Some(Self {
            bucket,
            ptr,
            remaining,
        })
    }

    /// Bytes still to come.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Give back the bucket array so its allocation can be reused.
    pub fn into_bucket(self) -> Vec<u32> {
        self.bucket
    }
}

impl Iterator for BwtWalk {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let byte = self.ptr as u8;
        // Every entry was written by build_bucket_array, so ptr >> 8 is always in bounds.
        self.ptr = self.bucket[(self.ptr >> 8) as usize];
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BwtWalk {}
