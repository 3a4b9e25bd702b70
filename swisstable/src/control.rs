//! Control bytes and hash splitting.
//!
//! Every slot owns one control byte. A byte in `0x00..=0x7F` marks the slot
//! full and stores the low 7 bits of the key's hash. The two special states
//! both carry the top bit, so "not full" is a single sign test.

/// Slots scanned together by the group matcher.
pub const GROUP_WIDTH: usize = 16;

/// Maximum number of full slots per group before the table grows.
pub const GROUP_LOAD: usize = GROUP_WIDTH - GROUP_WIDTH / 8;

/// Returned by lookups that found nothing.
pub const SENTINEL: usize = usize::MAX;

/// Tables with at least this many groups give their allocation back on clear.
pub const DROP_THRESHOLD: usize = 127;

pub const EMPTY: u8 = 0x80;
pub const TOMBSTONE: u8 = 0xFE;

static_assertions::const_assert_eq!(GROUP_LOAD, 14);
static_assertions::const_assert!(EMPTY & 0x80 != 0 && TOMBSTONE & 0x80 != 0);

#[inline(always)]
pub fn is_full(byte: u8) -> bool {
    byte & 0x80 == 0
}

/// Group selector.
#[inline(always)]
pub fn h1(hash: u64) -> usize {
    (hash >> 7) as usize
}

/// Tag stored in the control byte.
#[inline(always)]
pub fn h2(hash: u64) -> u8 {
    (hash & 0x7F) as u8
}

/// Triangular walk over group indices: `g, g+1, g+3, g+6, ...` modulo the
/// group count. For a power-of-two count every group is visited exactly once
/// in the first `groups` steps.
#[derive(Clone, Copy, Debug)]
pub struct ProbeSeq {
    group: usize,
    stride: usize,
    mask: usize,
}

impl ProbeSeq {
    #[inline(always)]
    pub fn new(hash: u64, groups: usize) -> Self {
        debug_assert!(groups.is_power_of_two());
        Self {
            group: h1(hash) & (groups - 1),
            stride: 0,
            mask: groups - 1,
        }
    }
    #[inline(always)]
    pub fn group(&self) -> usize {
        self.group
    }
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.group() * GROUP_WIDTH
    }
    #[inline(always)]
    pub fn move_next(&mut self) {
        self.stride += 1;
        self.group = (self.group + self.stride) & self.mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split() {
        let hash = 0xDEAD_BEEF_u64;
        assert_eq!(h2(hash), 0x6F);
        assert_eq!(h1(hash), (0xDEAD_BEEF_u64 >> 7) as usize);
        assert_eq!(h2(u64::MAX), 0x7F);
        assert!(is_full(h2(u64::MAX)));
        assert!(!is_full(EMPTY));
        assert!(!is_full(TOMBSTONE));
    }

    #[test]
    fn probe_covers_every_group() {
        for groups in [1usize, 2, 4, 8, 64, 1024] {
            for hash in [0u64, 0x80, 0x1234_5678_9ABC, u64::MAX] {
                let mut seen = vec![false; groups];
                let mut probe = ProbeSeq::new(hash, groups);
                for _ in 0..groups {
                    assert!(!seen[probe.group()]);
                    seen[probe.group()] = true;
                    probe.move_next();
                }
                assert!(seen.into_iter().all(|x| x));
            }
        }
    }

    #[test]
    fn probe_strides() {
        let mut probe = ProbeSeq::new(3 << 7, 16);
        let mut groups = Vec::new();
        for _ in 0..5 {
            groups.push(probe.group());
            probe.move_next();
        }
        assert_eq!(groups, vec![3, 4, 6, 9, 13]);
        assert_eq!(ProbeSeq::new(5 << 7, 8).offset(), 5 * GROUP_WIDTH);
    }
}
