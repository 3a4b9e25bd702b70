/// One bit per slot of a group, lowest bit first.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BitMask(pub(crate) u16);

impl BitMask {
    #[inline(always)]
    pub fn bits(self) -> u16 {
        self.0
    }
    #[inline(always)]
    pub fn any(self) -> bool {
        self.bits() != 0
    }
    #[inline(always)]
    pub fn lowest_set_bit(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }
    #[inline(always)]
    pub fn invert(self) -> Self {
        Self(!self.0)
    }
}

impl Iterator for BitMask {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        let bit = self.lowest_set_bit()?;
        self.0 &= self.0 - 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitMask {}
