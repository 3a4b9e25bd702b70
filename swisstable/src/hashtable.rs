use crate::control::{GROUP_LOAD, GROUP_WIDTH, SENTINEL};
use crate::raw::{RawIntoIter, RawIter, RawIterMut, RawTable};
use crate::traits::{DefaultEq, DefaultHashBuilder, EqFn, HashFn};
use std::borrow::Borrow;
use std::fmt;

/// Hash map over a [`RawTable`] of `(K, V)` pairs.
///
/// `H` hashes keys and `E` compares them. Lookups take any `Q` the stored key
/// borrows as, provided both functors accept `Q` too.
#[derive(Clone)]
pub struct Hashtable<K, V, H = DefaultHashBuilder, E = DefaultEq> {
    raw: RawTable<(K, V)>,
    hasher: H,
    eq: E,
}

impl<K, V> Hashtable<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, H, E: Default> Hashtable<K, V, H, E> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_eq(hasher, E::default())
    }
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Self {
        Self {
            raw: RawTable::with_groups(RawTable::<(K, V)>::groups_for(capacity)),
            hasher,
            eq: E::default(),
        }
    }
}

impl<K, V, H, E> Hashtable<K, V, H, E> {
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
    /// Always `16 * groups`.
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
    /// Drops every entry. Large tables release their storage, which is
    /// allocated again by the next insert.
    pub fn clear(&mut self) {
        self.raw.clear();
    }
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw.iter(),
        }
    }
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.raw.iter_mut(),
        }
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
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
        self.raw.find(hash, |(k, _)| self.eq.equals(k.borrow(), key))
    }
    pub fn find<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        match self.find_index(key) {
            SENTINEL => None,
            index => {
                let (k, v) = unsafe { self.raw.item(index) };
                Some((k, v))
            }
        }
    }
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        self.find(key).map(|(_, v)| v)
    }
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        match self.find_index(key) {
            SENTINEL => None,
            index => Some(unsafe { &mut self.raw.item_mut(index).1 }),
        }
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
    /// Drops the entry for `key`. Returns whether there was one.
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
        self.raw.erase(hash, |(k, _)| eq.equals(k.borrow(), key))
    }
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized,
        K: Borrow<Q>,
        H: HashFn<Q>,
        E: EqFn<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
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
        self.raw.remove(hash, |(k, _)| eq.equals(k.borrow(), key))
    }
}

impl<K, V, H, E> Hashtable<K, V, H, E>
where
    H: HashFn<K>,
    E: EqFn<K>,
{
    #[inline]
    fn grow_if_needed(&mut self) {
        if self.raw.needs_growth() {
            let hasher = &self.hasher;
            self.raw.grow(|(k, _)| hasher.hash_key(k));
        }
    }
    /// Makes room for `additional` more entries without further growth.
    pub fn reserve(&mut self, additional: usize) {
        let wanted = self.len().checked_add(additional).expect("capacity overflow");
        let groups = RawTable::<(K, V)>::groups_for(wanted);
        if groups > self.raw.groups() {
            let hasher = &self.hasher;
            self.raw.resize(groups, |(k, _)| hasher.hash_key(k));
        }
    }
    /// Inserts or overwrites. Returns `true` if a new slot was used; an
    /// existing entry keeps its key and gets `value`.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.grow_if_needed();
        let hash = self.hasher.hash_key(&key);
        let eq = &self.eq;
        let index = self.raw.find(hash, |(k, _)| eq.equals(k, &key));
        if index != SENTINEL {
            unsafe {
                self.raw.item_mut(index).1 = value;
            }
            return false;
        }
        let slot = self.raw.find_empty_or_tombstone(hash);
        unsafe {
            self.raw.insert_at(slot, hash, (key, value));
        }
        true
    }
    /// `Ok` with the value built by `f` if `key` was absent, `Err` with the
    /// existing value otherwise.
    pub fn find_or_insert_with<F>(&mut self, key: K, f: F) -> Result<&mut V, &mut V>
    where
        F: FnOnce() -> V,
    {
        self.grow_if_needed();
        let hash = self.hasher.hash_key(&key);
        let eq = &self.eq;
        let index = self.raw.find(hash, |(k, _)| eq.equals(k, &key));
        if index != SENTINEL {
            return Err(unsafe { &mut self.raw.item_mut(index).1 });
        }
        let slot = self.raw.find_empty_or_tombstone(hash);
        let (_, v) = unsafe { self.raw.insert_at(slot, hash, (key, f())) };
        Ok(v)
    }
}

impl<K, V, H: Default, E: Default> Default for Hashtable<K, V, H, E> {
    fn default() -> Self {
        Self::with_hasher_and_eq(H::default(), E::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H, E> fmt::Debug for Hashtable<K, V, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H, E> Extend<(K, V)> for Hashtable<K, V, H, E>
where
    H: HashFn<K>,
    E: EqFn<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, H, E> FromIterator<(K, V)> for Hashtable<K, V, H, E>
where
    H: HashFn<K> + Default,
    E: EqFn<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K, V, H, E> IntoIterator for Hashtable<K, V, H, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.raw.into_iter()
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a Hashtable<K, V, H, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a mut Hashtable<K, V, H, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Owning iterator over the entries of a [`Hashtable`].
pub type IntoIter<K, V> = RawIntoIter<(K, V)>;

pub struct Iter<'a, K, V> {
    inner: RawIter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next()?;
        Some((k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

pub struct IterMut<'a, K, V> {
    inner: RawIterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next()?;
        Some((&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FastHasher;

    #[test]
    fn overwrite_keeps_size() {
        let mut table = Hashtable::<String, i32>::new();
        assert!(table.insert("test".to_string(), 7));
        assert!(!table.insert("test".to_string(), 8));
        assert_eq!(table.get("test"), Some(&8));
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn two_keys_one_group() {
        let mut table = Hashtable::<&str, i32>::new();
        table.insert("test", 7);
        table.insert("bob", 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.find("bob"), Some((&"bob", &1)));
        assert!(table.contains("test"));
        assert!(!table.contains("alice"));
    }

    #[test]
    fn empty_table_has_no_storage() {
        let mut table = Hashtable::<u64, u64>::new();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.load_factor(), 0.0);
        assert_eq!(table.max_load_factor(), 0.875);
        assert_eq!(table.get(&1), None);
        assert!(!table.erase(&1));
        assert_eq!(table.remove(&1), None);
        table.clear();
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn growth_at_group_load() {
        let mut table = Hashtable::<u64, (), FastHasher>::default();
        for key in 0..14 {
            table.insert(key, ());
        }
        assert_eq!(table.capacity(), 16);
        table.insert(14, ());
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.load_factor(), 15.0 / 32.0);
    }

    #[test]
    fn find_or_insert_with() {
        let mut table = Hashtable::<u64, u64, FastHasher>::default();
        for key in [3u64, 1, 3, 3, 2, 1] {
            match table.find_or_insert_with(key, || 1) {
                Ok(_) => {}
                Err(count) => *count += 1,
            }
        }
        assert_eq!(table.get(&3), Some(&3));
        assert_eq!(table.get(&1), Some(&2));
        assert_eq!(table.get(&2), Some(&1));
    }

    #[test]
    fn get_mut_and_iter_mut() {
        let mut table: Hashtable<u32, u32> = (0..100).map(|k| (k, k)).collect();
        *table.get_mut(&10).unwrap() = 1000;
        for (_, v) in table.iter_mut() {
            *v += 1;
        }
        assert_eq!(table.get(&10), Some(&1001));
        assert_eq!(table.get(&99), Some(&100));
        assert_eq!(table.values().copied().max(), Some(1001));
        assert_eq!(table.keys().count(), 100);
    }

    #[test]
    fn remove_entry_moves_out() {
        let mut table = Hashtable::<String, Vec<u8>>::new();
        table.insert("a".to_string(), vec![1, 2, 3]);
        assert_eq!(table.remove_entry("a"), Some(("a".to_string(), vec![1, 2, 3])));
        assert!(table.is_empty());
    }

    #[test]
    fn reserve_avoids_growth() {
        let mut table = Hashtable::<u32, u32>::new();
        table.reserve(100);
        let capacity = table.capacity();
        assert_eq!(capacity, 128);
        for key in 0..100 {
            table.insert(key, key);
        }
        assert_eq!(table.capacity(), capacity);
        let table = Hashtable::<u32, u32>::with_capacity(29);
        assert_eq!(table.capacity(), 64);
    }

    #[test]
    fn custom_eq() {
        #[derive(Default)]
        struct CaseInsensitive;

        impl EqFn<str> for CaseInsensitive {
            fn equals(&self, stored: &str, key: &str) -> bool {
                stored.eq_ignore_ascii_case(key)
            }
        }

        #[derive(Default)]
        struct LowerHash;

        impl HashFn<str> for LowerHash {
            fn hash_key(&self, key: &str) -> u64 {
                FastHasher.hash_key(key.to_ascii_lowercase().as_str())
            }
        }

        impl HashFn<String> for LowerHash {
            fn hash_key(&self, key: &String) -> u64 {
                self.hash_key(key.as_str())
            }
        }

        impl EqFn<String> for CaseInsensitive {
            fn equals(&self, stored: &String, key: &String) -> bool {
                self.equals(stored.as_str(), key.as_str())
            }
        }

        let mut table = Hashtable::<String, u8, LowerHash, CaseInsensitive>::default();
        assert!(table.insert("Swiss".to_string(), 1));
        assert!(!table.insert("SWISS".to_string(), 2));
        assert_eq!(table.get("swiss"), Some(&2));
        assert_eq!(table.find("sWiSs").map(|(k, _)| k.as_str()), Some("Swiss"));
        assert_eq!(table.hasher().hash_key("SwIsS"), table.hasher().hash_key("swiss"));
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn with_capacity_overflow() {
        Hashtable::<u64, u64>::with_capacity(usize::MAX);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn reserve_overflow() {
        let mut table = Hashtable::<u64, u64>::new();
        table.insert(1, 1);
        table.reserve(usize::MAX - 5);
    }

    #[test]
    fn iterators_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}

        let mut table: Hashtable<u64, u64> = (0..10).map(|k| (k, k)).collect();
        assert_send_sync(&table);
        assert_send_sync(&table.iter());
        assert_send_sync(&table.iter_mut());
        let iter = table.into_iter();
        assert_send_sync(&iter);
        let total: u64 = std::thread::spawn(move || iter.map(|(_, v)| v).sum())
            .join()
            .unwrap();
        assert_eq!(total, 45);
    }

    #[test]
    fn debug_and_clone() {
        let mut table = Hashtable::<u8, u8>::new();
        table.insert(1, 2);
        let copy = table.clone();
        table.clear();
        assert_eq!(format!("{:?}", copy), "{1: 2}");
        assert_eq!(format!("{:?}", table), "{}");
    }
}
