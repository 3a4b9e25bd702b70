use std::hash::{BuildHasher, Hash, Hasher};

/// Hash functor. Must be deterministic and agree with the table's [`EqFn`]:
/// keys that compare equal hash equally.
pub trait HashFn<Q: ?Sized> {
    fn hash_key(&self, key: &Q) -> u64;
}

/// Equality functor between a stored key and a probe key.
pub trait EqFn<Q: ?Sized> {
    fn equals(&self, stored: &Q, key: &Q) -> bool;
}

impl<Q, S> HashFn<Q> for S
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline(always)]
    fn hash_key(&self, key: &Q) -> u64 {
        let mut hasher = self.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }
}

/// Equality through `PartialEq`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEq;

impl<Q: PartialEq + ?Sized> EqFn<Q> for DefaultEq {
    #[inline(always)]
    fn equals(&self, stored: &Q, key: &Q) -> bool {
        stored == key
    }
}

pub type DefaultHashBuilder = ahash::RandomState;

/// Keys with a cheap dedicated hash.
pub trait FastHash {
    fn fast_hash(&self) -> u64;
}
