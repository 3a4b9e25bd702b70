use crate::traits::{FastHash, HashFn};

const CRC_A: u32 = u32::MAX;
const CRC_B: u32 = 0;

/// Hash functor for [`FastHash`] keys.
///
/// Unlike the default `ahash` builder it is not seeded, so equal keys hash
/// equally across tables and runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastHasher;

impl<Q: FastHash + ?Sized> HashFn<Q> for FastHasher {
    #[inline(always)]
    fn hash_key(&self, key: &Q) -> u64 {
        key.fast_hash()
    }
}

macro_rules! impl_fast_hash_for_primitive_types {
    ($t: ty) => {
        impl FastHash for $t {
            #[inline(always)]
            fn fast_hash(&self) -> u64 {
                cfg_if::cfg_if! {
                    if #[cfg(all(target_arch = "x86_64", target_feature = "sse4.2"))] {
                        use std::arch::x86_64::_mm_crc32_u64;
                        let mut high = CRC_A;
                        let mut low = CRC_B;
                        high = unsafe { _mm_crc32_u64(high as u64, *self as u64) as u32 };
                        low = unsafe { _mm_crc32_u64(low as u64, *self as u64) as u32 };
                        (high as u64) << 32 | low as u64
                    } else {
                        let mut hasher = *self as u64;
                        hasher ^= hasher >> 33;
                        hasher = hasher.wrapping_mul(0xff51afd7ed558ccd_u64);
                        hasher ^= hasher >> 33;
                        hasher = hasher.wrapping_mul(0xc4ceb9fe1a85ec53_u64);
                        hasher ^= hasher >> 33;
                        hasher
                    }
                }
            }
        }
    };
}

impl_fast_hash_for_primitive_types!(u8);
impl_fast_hash_for_primitive_types!(i8);
impl_fast_hash_for_primitive_types!(u16);
impl_fast_hash_for_primitive_types!(i16);
impl_fast_hash_for_primitive_types!(u32);
impl_fast_hash_for_primitive_types!(i32);
impl_fast_hash_for_primitive_types!(u64);
impl_fast_hash_for_primitive_types!(i64);
impl_fast_hash_for_primitive_types!(usize);
impl_fast_hash_for_primitive_types!(isize);

impl FastHash for [u8] {
    #[inline(always)]
    fn fast_hash(&self) -> u64 {
        cfg_if::cfg_if! {
            if #[cfg(all(target_arch = "x86_64", target_feature = "sse4.2"))] {
                use std::arch::x86_64::_mm_crc32_u64;
                let mut high = CRC_A;
                let mut low = CRC_B;
                let mut chunks = self.chunks_exact(8);
                for chunk in chunks.by_ref() {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(chunk);
                    let x = u64::from_le_bytes(word);
                    high = unsafe { _mm_crc32_u64(high as u64, x) as u32 };
                    low = unsafe { _mm_crc32_u64(low as u64, x) as u32 };
                }
                let rest = chunks.remainder();
                let mut word = [0u8; 8];
                word[..rest.len()].copy_from_slice(rest);
                // the length keeps "a" and "a\0" apart
                let x = u64::from_le_bytes(word) ^ ((self.len() as u64) << 56);
                high = unsafe { _mm_crc32_u64(high as u64, x) as u32 };
                low = unsafe { _mm_crc32_u64(low as u64, x) as u32 };
                (high as u64) << 32 | low as u64
            } else {
                use std::hash::Hasher;
                let mut hasher = ahash::AHasher::new_with_keys(CRC_A as u128, CRC_B as u128);
                hasher.write(self);
                hasher.write_usize(self.len());
                hasher.finish()
            }
        }
    }
}

impl FastHash for str {
    #[inline(always)]
    fn fast_hash(&self) -> u64 {
        self.as_bytes().fast_hash()
    }
}

impl FastHash for Vec<u8> {
    #[inline(always)]
    fn fast_hash(&self) -> u64 {
        self.as_slice().fast_hash()
    }
}

impl FastHash for Box<[u8]> {
    #[inline(always)]
    fn fast_hash(&self) -> u64 {
        self.as_ref().fast_hash()
    }
}

impl FastHash for String {
    #[inline(always)]
    fn fast_hash(&self) -> u64 {
        self.as_bytes().fast_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DefaultHashBuilder;

    #[test]
    fn deterministic() {
        assert_eq!(FastHasher.hash_key(&42u64), FastHasher.hash_key(&42u64));
        assert_eq!(
            FastHasher.hash_key("swiss"),
            FastHasher.hash_key(&String::from("swiss"))
        );
        assert_eq!(
            FastHasher.hash_key(&b"swiss"[..]),
            FastHasher.hash_key(&b"swiss".to_vec())
        );
    }

    #[test]
    fn spreads_tags() {
        let mut tags = std::collections::HashSet::new();
        for i in 0..4096u64 {
            tags.insert(FastHasher.hash_key(&i) & 0x7F);
        }
        assert!(tags.len() > 100);
    }

    #[test]
    fn length_matters() {
        assert_ne!(FastHasher.hash_key(&b"a"[..]), FastHasher.hash_key(&b"a\0"[..]));
        assert_ne!(FastHasher.hash_key(&b""[..]), FastHasher.hash_key(&b"\0"[..]));
    }

    #[test]
    fn build_hasher_is_a_hash_fn() {
        let state = DefaultHashBuilder::new();
        assert_eq!(state.hash_key("bob"), state.hash_key(&"bob"));
    }
}
