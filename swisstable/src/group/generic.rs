//! Portable matcher working on two 64-bit words.
//!
//! Every mask is exact. The usual `(x - 0x01..) & !x & 0x80..` zero test is
//! avoided since it can flag the byte after a real match.

use super::BitMask;
use crate::control::EMPTY;

const LO: u64 = 0x7F7F_7F7F_7F7F_7F7F;
const HI: u64 = 0x8080_8080_8080_8080;
const REPEAT: u64 = 0x0101_0101_0101_0101;
const GATHER: u64 = 0x0102_0408_1020_4080;

#[derive(Clone, Copy)]
pub struct Group {
    lo: u64,
    hi: u64,
}

/// Top bit of every byte that is zero.
#[inline(always)]
fn zero_bytes(x: u64) -> u64 {
    !(((x & LO).wrapping_add(LO)) | x | LO)
}

/// Packs the top bit of each byte into the low 8 bits, byte 0 first.
#[inline(always)]
fn gather(top_bits: u64) -> u16 {
    ((top_bits >> 7).wrapping_mul(GATHER) >> 56) as u16
}

impl Group {
    /// # Safety
    ///
    /// `ptr` must be 8-aligned and valid for 16 byte reads.
    #[inline(always)]
    pub unsafe fn load(ptr: *const u8) -> Self {
        let words = ptr as *const u64;
        Group {
            lo: u64::from_le(words.read()),
            hi: u64::from_le(words.add(1).read()),
        }
    }
    #[inline(always)]
    fn collect(self, f: impl Fn(u64) -> u64) -> BitMask {
        BitMask(gather(f(self.lo)) | gather(f(self.hi)) << 8)
    }
    #[inline(always)]
    pub fn match_byte(self, byte: u8) -> BitMask {
        let pattern = REPEAT.wrapping_mul(byte as u64);
        self.collect(|word| zero_bytes(word ^ pattern))
    }
    #[inline(always)]
    pub fn match_empty(self) -> BitMask {
        self.match_byte(EMPTY)
    }
    #[inline(always)]
    pub fn match_empty_or_tombstone(self) -> BitMask {
        self.collect(|word| word & HI)
    }
    #[inline(always)]
    pub fn match_full(self) -> BitMask {
        self.match_empty_or_tombstone().invert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_positions() {
        assert_eq!(gather(0x80), 0b1);
        assert_eq!(gather(0x8000_0000_0000_0000), 0b1000_0000);
        assert_eq!(gather(HI), 0xFF);
        assert_eq!(gather(0x0080_0000_0000_8000), 0b0100_0010);
    }

    #[test]
    fn zero_bytes_exact() {
        assert_eq!(zero_bytes(0), HI);
        assert_eq!(zero_bytes(u64::MAX), 0);
        assert_eq!(zero_bytes(0x0100), 0x8080_8080_8080_0080);
        assert_eq!(zero_bytes(0x8000_0000_0000_0001), 0x0080_8080_8080_8000);
    }
}
