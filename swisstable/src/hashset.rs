use crate::control::{GROUP_LOAD, GROUP_WIDTH, SENTINEL};
use crate::raw::{RawIntoIter, RawIter, RawTable};
use crate::traits::{DefaultEq, DefaultHashBuilder, EqFn, HashFn};
use std::borrow::Borrow;
use std::fmt;

/// Hash set over a [`RawTable`] of keys.
#[derive(Clone)]
pub struct Hashset<K, H = DefaultHashBuilder, E = DefaultEq> {
    raw: RawTable<K>,
    hasher: H,
    eq: E,
}

impl<K> Hashset<K> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, H, E: Default> Hashset<K, H, E> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_eq(hasher, E::default())
    }
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Self {
        Self {
            raw: RawTable::with_groups(RawTable::<K>::groups_for(capacity)),
            hasher,
            eq: E::default(),
        }
    }
}

impl<K, H, E> Hashset<K, H, E> {
    pub fn with_hasher_and_eq(hasher: H, eq: E) -> Self {
        Self {
            raw: RawTable::new(),
            hasher,
            eq,
        }
    }
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.raw.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
    pub fn load_factor(&self) -> f32 {
        if self.capacity() == 0 {
            0.0
        } else {
            self.len() as f32 / self.capacity() as f32
        }
    }
    pub fn max_load_factor(&self) -> f32 {
        GROUP_LOAD as f32 / GROUP_WIDTH as f32
    }
    pub fn clear(&mut self) {
        self.raw.clear();
    }
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.raw.iter(),
        }
    }
    #[inline]
    fn find_index<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        if self.raw.groups() == 0 {
            return SENTINEL;
        }
        let hash = self.hasher.hash_key(key);
        self.raw.find(hash, |k| self.eq.equals(k.borrow(), key))
    }
    /// The stored key equal to `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<&K>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        match self.find_index(key) {
            SENTINEL => None,
            index => Some(unsafe { self.raw.item(index) }),
        }
    }
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        self.find(key)
    }
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        self.find_index(key) != SENTINEL
    }
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        if self.raw.groups() == 0 {
            return false;
        }
        let hash = self.hasher.hash_key(key);
        let eq = &self.eq;
        self.raw.erase(hash, |k| eq.equals(k.borrow(), key))
    }
    /// Removes and returns the stored key equal to `key`.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        if self.raw.groups() == 0 {
            return None;
        }
        let hash = self.hasher.hash_key(key);
        let eq = &self.eq;
        self.raw.remove(hash, |k| eq.equals(k.borrow(), key))
    }
}

impl<K, H, E> Hashset<K, H, E>
where
    H: HashFn<K>,
    E: EqFn<K>,
{
    #[inline]
    fn grow_if_needed(&mut self) {
        if self.raw.needs_growth() {
            let hasher = &self.hasher;
            self.raw.grow(|k| hasher.hash_key(k));
        }
    }
    pub fn reserve(&mut self, additional: usize) {
        let wanted = self.len().checked_add(additional).expect("capacity overflow");
        let groups = RawTable::<K>::groups_for(wanted);
        if groups > self.raw.groups() {
            let hasher = &self.hasher;
            self.raw.resize(groups, |k| hasher.hash_key(k));
        }
    }
    /// Returns `true` if `key` was absent. A present key is left as stored.
    pub fn insert(&mut self, key: K) -> bool {
        self.grow_if_needed();
        let hash = self.hasher.hash_key(&key);
        let eq = &self.eq;
        if self.raw.find(hash, |k| eq.equals(k, &key)) != SENTINEL {
            return false;
        }
        let slot = self.raw.find_empty_or_tombstone(hash);
        unsafe {
            self.raw.insert_at(slot, hash, key);
        }
        true
    }
}

impl<K, H: Default, E: Default> Default for Hashset<K, H, E> {
    fn default() -> Self {
        Self::with_hasher_and_eq(H::default(), E::default())
    }
}

impl<K: fmt::Debug, H, E> fmt::Debug for Hashset<K, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, H, E> Extend<K> for Hashset<K, H, E>
where
    H: HashFn<K>,
    E: EqFn<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}

impl<K, H, E> FromIterator<K> for Hashset<K, H, E>
where
    H: HashFn<K> + Default,
    E: EqFn<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<K, H, E> IntoIterator for Hashset<K, H, E> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        self.raw.into_iter()
    }
}

impl<'a, K, H, E> IntoIterator for &'a Hashset<K, H, E> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub type IntoIter<K> = RawIntoIter<K>;

pub struct Iter<'a, K> {
    inner: RawIter<'a, K>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FastHasher;

    #[test]
    fn insert_twice() {
        let mut set = Hashset::<String>::new();
        assert!(set.insert("test".to_string()));
        assert!(!set.insert("test".to_string()));
        assert_eq!(set.len(), 1);
        assert_eq!(set.capacity(), 16);
        assert_eq!(set.find("test").map(String::as_str), Some("test"));
        assert_eq!(set.get("nope"), None);
    }

    #[test]
    fn erase_then_absent() {
        let mut set: Hashset<u64, FastHasher> = (0..1000).collect();
        for k in (0..1000).step_by(3) {
            assert!(set.erase(&k));
        }
        for k in 0..1000 {
            assert_eq!(set.contains(&k), k % 3 != 0);
        }
        assert!(!set.erase(&0));
        assert_eq!(set.take(&1), Some(1));
        assert_eq!(set.take(&1), None);
        assert_eq!(set.len(), 1000 - 334 - 1);
    }

    #[test]
    fn keeps_first_stored_key() {
        #[derive(Debug, Clone)]
        struct Tagged(u32, &'static str);

        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl std::hash::Hash for Tagged {
            fn hash<S: std::hash::Hasher>(&self, state: &mut S) {
                self.0.hash(state);
            }
        }

        let mut set = Hashset::<Tagged>::new();
        assert!(set.insert(Tagged(1, "first")));
        assert!(!set.insert(Tagged(1, "second")));
        assert_eq!(set.find(&Tagged(1, "")).map(|t| t.1), Some("first"));
    }

    #[test]
    fn iterate_and_consume() {
        let mut set = Hashset::<u32>::with_capacity(10);
        set.extend([5, 6, 7, 5]);
        let mut seen: Vec<u32> = set.iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![5, 6, 7]);
        assert_eq!(format!("{:?}", Hashset::<u32>::new()), "{}");
        let mut owned: Vec<u32> = set.clone().into_iter().collect();
        owned.sort_unstable();
        assert_eq!(owned, seen);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn hasher_is_shared() {
        let set = Hashset::<u64, FastHasher>::with_hasher(FastHasher);
        assert_eq!(set.hasher().hash_key(&42u64), FastHasher.hash_key(&42u64));
        assert_eq!(set.capacity(), 0);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn with_capacity_overflow() {
        Hashset::<u64>::with_capacity(usize::MAX);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn reserve_overflow() {
        let mut set = Hashset::<u64>::new();
        set.reserve(usize::MAX - 5);
    }

    #[test]
    fn iterators_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}

        let set: Hashset<u64> = (0..10).collect();
        assert_send_sync(&set.iter());
        let iter = set.into_iter();
        assert_send_sync(&iter);
        let total: u64 = std::thread::spawn(move || iter.sum()).join().unwrap();
        assert_eq!(total, 45);
    }
}
