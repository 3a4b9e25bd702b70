use super::BitMask;
use crate::control::EMPTY;

#[cfg(target_arch = "x86")]
use std::arch::x86 as arch;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64 as arch;

#[derive(Clone, Copy)]
pub struct Group(arch::__m128i);

impl Group {
    /// # Safety
    ///
    /// `ptr` must be 16-aligned and valid for 16 byte reads.
    #[inline(always)]
    pub unsafe fn load(ptr: *const u8) -> Self {
        debug_assert_eq!(ptr as usize % 16, 0);
        Group(arch::_mm_load_si128(ptr as *const arch::__m128i))
    }
    #[inline(always)]
    pub fn match_byte(self, byte: u8) -> BitMask {
        unsafe {
            let cmp = arch::_mm_cmpeq_epi8(self.0, arch::_mm_set1_epi8(byte as i8));
            BitMask(arch::_mm_movemask_epi8(cmp) as u16)
        }
    }
    #[inline(always)]
    pub fn match_empty(self) -> BitMask {
        self.match_byte(EMPTY)
    }
    /// Both special bytes have the top bit set, which is exactly what
    /// `movemask` collects.
    #[inline(always)]
    pub fn match_empty_or_tombstone(self) -> BitMask {
        unsafe { BitMask(arch::_mm_movemask_epi8(self.0) as u16) }
    }
    #[inline(always)]
    pub fn match_full(self) -> BitMask {
        self.match_empty_or_tombstone().invert()
    }
}
