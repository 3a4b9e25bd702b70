use hashbrown::hash_map::EntryRef;
use hashbrown::HashMap as HashbrownMap;
use swisstable::{FastHasher, Hashtable};

/// A count-distinct map under benchmark.
pub trait Subject {
    const NAME: &'static str;
    fn new() -> Self;
    fn build(&mut self, key: Box<[u8]>, insert: impl FnMut() -> u64, update: impl FnMut(&mut u64));
    fn probe(&self, key: &[u8]) -> Option<u64>;
    fn foreach<F: FnMut((&[u8], u64))>(&self, f: F);
}

impl Subject for HashbrownMap<Box<[u8]>, u64> {
    const NAME: &'static str = "hashbrown";

    fn new() -> Self {
        Self::new()
    }

    fn build(
        &mut self,
        key: Box<[u8]>,
        mut insert: impl FnMut() -> u64,
        mut update: impl FnMut(&mut u64),
    ) {
        use EntryRef::*;
        match self.entry_ref(key.as_ref()) {
            Occupied(mut o) => update(o.get_mut()),
            Vacant(v) => {
                v.insert(insert());
            }
        }
    }

    fn probe(&self, key: &[u8]) -> Option<u64> {
        self.get(key).copied()
    }

    fn foreach<F: FnMut((&[u8], u64))>(&self, f: F) {
        self.iter().map(|(x, y)| (x.as_ref(), *y)).for_each(f)
    }
}

impl Subject for Hashtable<Box<[u8]>, u64, FastHasher> {
    const NAME: &'static str = "swisstable";

    fn new() -> Self {
        Self::default()
    }

    fn build(
        &mut self,
        key: Box<[u8]>,
        mut insert: impl FnMut() -> u64,
        mut update: impl FnMut(&mut u64),
    ) {
        match self.find_or_insert_with(key, &mut insert) {
            Ok(_) => {}
            Err(x) => update(x),
        }
    }

    fn probe(&self, key: &[u8]) -> Option<u64> {
        self.get(key).copied()
    }

    fn foreach<F: FnMut((&[u8], u64))>(&self, f: F) {
        self.iter().map(|(k, v)| (k.as_ref(), *v)).for_each(f)
    }
}

impl Subject for Hashtable<Box<[u8]>, u64> {
    const NAME: &'static str = "swisstable-ahash";

    fn new() -> Self {
        Self::new()
    }

    fn build(
        &mut self,
        key: Box<[u8]>,
        mut insert: impl FnMut() -> u64,
        mut update: impl FnMut(&mut u64),
    ) {
        match self.find_or_insert_with(key, &mut insert) {
            Ok(_) => {}
            Err(x) => update(x),
        }
    }

    fn probe(&self, key: &[u8]) -> Option<u64> {
        self.get(key).copied()
    }

    fn foreach<F: FnMut((&[u8], u64))>(&self, f: F) {
        self.iter().map(|(k, v)| (k.as_ref(), *v)).for_each(f)
    }
}
