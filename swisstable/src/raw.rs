//! Table operations shared by [`Hashtable`](crate::hashtable::Hashtable) and
//! [`Hashset`](crate::hashset::Hashset).
//!
//! `RawTable` knows nothing about keys. Callers pass the hash of the key they
//! are after and a predicate that recognises the stored item.
//!
//! An item slot is initialized if and only if its control byte is full. Every
//! `unsafe` read of an item below relies on that.

use crate::control::{
    h2, is_full, ProbeSeq, DROP_THRESHOLD, EMPTY, GROUP_LOAD, GROUP_WIDTH, SENTINEL, TOMBSTONE,
};
use crate::group::{BitMask, Group};
use crate::layout::{allocate, deallocate};
use std::marker::PhantomData;
use std::mem::needs_drop;
use std::ptr::NonNull;

pub struct RawTable<T> {
    groups: usize,
    size: usize,
    control: NonNull<u8>,
    items: NonNull<T>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for RawTable<T> {}
unsafe impl<T: Sync> Sync for RawTable<T> {}

impl<T> RawTable<T> {
    /// An empty table. Nothing is allocated until the first growth.
    pub const fn new() -> Self {
        Self {
            groups: 0,
            size: 0,
            control: NonNull::dangling(),
            items: NonNull::dangling(),
            _marker: PhantomData,
        }
    }
    /// # Panics
    ///
    /// Panics if `groups` is neither zero nor a power of two.
    pub fn with_groups(groups: usize) -> Self {
        if groups == 0 {
            return Self::new();
        }
        assert!(groups.is_power_of_two(), "group count must be a power of two");
        let storage = allocate::<T>(groups);
        Self {
            groups,
            size: 0,
            control: storage.control,
            items: storage.items,
            _marker: PhantomData,
        }
    }
    /// Smallest group count whose load limit admits `capacity` items.
    pub fn groups_for(capacity: usize) -> usize {
        if capacity == 0 {
            return 0;
        }
        let groups = capacity
            .checked_add(GROUP_LOAD - 1)
            .expect("capacity overflow")
            / GROUP_LOAD;
        groups.checked_next_power_of_two().expect("capacity overflow")
    }
    #[inline(always)]
    pub fn groups(&self) -> usize {
        self.groups
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.size
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.groups * GROUP_WIDTH
    }
    /// Full slots allowed before the next insert has to grow.
    #[inline(always)]
    pub fn growth_limit(&self) -> usize {
        self.groups * GROUP_LOAD
    }
    #[inline(always)]
    pub fn needs_growth(&self) -> bool {
        self.size >= self.growth_limit()
    }
    /// The control bytes. Empty when nothing is allocated.
    pub fn control_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.control.as_ptr(), self.capacity()) }
    }
    #[inline(always)]
    unsafe fn group_at(&self, offset: usize) -> Group {
        Group::load(self.control.as_ptr().add(offset))
    }
    #[inline(always)]
    unsafe fn set_control(&mut self, index: usize, byte: u8) {
        *self.control.as_ptr().add(index) = byte;
    }
    /// # Safety
    ///
    /// `index` must be a full slot.
    #[inline(always)]
    pub unsafe fn item(&self, index: usize) -> &T {
        debug_assert!(is_full(self.control_bytes()[index]));
        &*self.items.as_ptr().add(index)
    }
    /// # Safety
    ///
    /// `index` must be a full slot.
    #[inline(always)]
    pub unsafe fn item_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(is_full(self.control_bytes()[index]));
        &mut *self.items.as_ptr().add(index)
    }
    /// Index of the item matching `eq` among those whose tag equals
    /// `h2(hash)`, or `SENTINEL`.
    ///
    /// A probed group holding an EMPTY byte ends the search. At most `groups`
    /// groups are visited, which covers the whole table.
    #[inline]
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> usize {
        if self.groups == 0 {
            return SENTINEL;
        }
        let tag = h2(hash);
        let mut probe = ProbeSeq::new(hash, self.groups);
        for _ in 0..self.groups {
            let offset = probe.offset();
            let group = unsafe { self.group_at(offset) };
            for bit in group.match_byte(tag) {
                let index = offset + bit;
                if eq(unsafe { &*self.items.as_ptr().add(index) }) {
                    return index;
                }
            }
            if group.match_empty().any() {
                return SENTINEL;
            }
            probe.move_next();
        }
        SENTINEL
    }
    /// First EMPTY or TOMBSTONE slot on the probe sequence of `hash`.
    ///
    /// # Panics
    ///
    /// Panics if every slot is full.
    #[inline]
    pub fn find_empty_or_tombstone(&self, hash: u64) -> usize {
        let mut probe = ProbeSeq::new(hash, std::cmp::max(1, self.groups));
        for _ in 0..self.groups {
            let offset = probe.offset();
            let group = unsafe { self.group_at(offset) };
            if let Some(bit) = group.match_empty_or_tombstone().lowest_set_bit() {
                return offset + bit;
            }
            probe.move_next();
        }
        panic!("the hash table overflows")
    }
    /// Writes `item` into `index` and tags the slot with `h2(hash)`.
    ///
    /// # Safety
    ///
    /// `index` must have been returned by `find_empty_or_tombstone` with no
    /// mutation of the table in between.
    #[inline]
    pub unsafe fn insert_at(&mut self, index: usize, hash: u64, item: T) -> &mut T {
        debug_assert!(!is_full(self.control_bytes()[index]));
        let slot = self.items.as_ptr().add(index);
        slot.write(item);
        self.set_control(index, h2(hash));
        self.size += 1;
        &mut *slot
    }
    /// Releases the control byte of a full slot. The item is left for the
    /// caller to drop or move out.
    ///
    /// The slot becomes EMPTY if its group still has an EMPTY byte and
    /// TOMBSTONE otherwise.
    unsafe fn release(&mut self, index: usize) {
        let offset = index & !(GROUP_WIDTH - 1);
        let byte = if self.group_at(offset).match_empty().any() {
            EMPTY
        } else {
            TOMBSTONE
        };
        self.set_control(index, byte);
        self.size -= 1;
    }
    pub fn erase(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> bool {
        let index = self.find(hash, eq);
        if index == SENTINEL {
            return false;
        }
        unsafe {
            self.release(index);
            std::ptr::drop_in_place(self.items.as_ptr().add(index));
        }
        true
    }
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.find(hash, eq);
        if index == SENTINEL {
            return None;
        }
        unsafe {
            self.release(index);
            Some(self.items.as_ptr().add(index).read())
        }
    }
    /// Drops every live item. Large tables give their allocation back, the
    /// rest keep it with every control byte reset to EMPTY.
    pub fn clear(&mut self) {
        if self.groups == 0 {
            return;
        }
        if self.drop_items() {
            *self = Self::new();
        } else {
            unsafe {
                self.control
                    .as_ptr()
                    .write_bytes(EMPTY, self.groups * GROUP_WIDTH);
            }
            self.size = 0;
        }
    }
    /// Drops live items, marking their slots EMPTY as it goes. Returns
    /// whether the allocation should be released rather than reset.
    fn drop_items(&mut self) -> bool {
        if needs_drop::<T>() {
            for index in unsafe { FullSlots::new(self.control, self.groups, self.size) } {
                unsafe {
                    self.set_control(index, EMPTY);
                    self.size -= 1;
                    std::ptr::drop_in_place(self.items.as_ptr().add(index));
                }
            }
        }
        self.groups >= DROP_THRESHOLD
    }
    /// Doubles the group count (an empty table gets one group) and moves
    /// every item across, rehashing it with `hasher`.
    ///
    /// Allocation failure aborts.
    pub fn grow(&mut self, hasher: impl Fn(&T) -> u64) {
        let groups = std::cmp::max(1, self.groups.checked_mul(2).expect("capacity overflow"));
        self.resize(groups, hasher);
    }
    /// # Panics
    ///
    /// Panics if `groups` cannot hold the current items.
    pub fn resize(&mut self, groups: usize, hasher: impl Fn(&T) -> u64) {
        assert!(self.size <= groups * GROUP_LOAD, "the hash table overflows");
        let mut table = Self::with_groups(groups);
        for index in unsafe { FullSlots::new(self.control, self.groups, self.size) } {
            unsafe {
                self.set_control(index, EMPTY);
                self.size -= 1;
                let item = self.items.as_ptr().add(index).read();
                let hash = hasher(&item);
                let slot = table.find_empty_or_tombstone(hash);
                table.insert_at(slot, hash, item);
            }
        }
        *self = table;
    }
    pub fn iter(&self) -> RawIter<'_, T> {
        RawIter {
            slots: unsafe { FullSlots::new(self.control, self.groups, self.size) },
            items: self.items,
            _marker: PhantomData,
        }
    }
    pub fn iter_mut(&mut self) -> RawIterMut<'_, T> {
        RawIterMut {
            slots: unsafe { FullSlots::new(self.control, self.groups, self.size) },
            items: self.items,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for RawTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawTable<T> {
    fn drop(&mut self) {
        if self.groups == 0 {
            return;
        }
        self.drop_items();
        unsafe {
            deallocate::<T>(self.groups, self.control);
        }
    }
}

impl<T: Clone> Clone for RawTable<T> {
    /// Same group count and control bytes, tombstones included, so every
    /// probe chain of the source still works in the copy.
    fn clone(&self) -> Self {
        let mut table = Self::with_groups(self.groups);
        for index in unsafe { FullSlots::new(self.control, self.groups, self.size) } {
            unsafe {
                let item = self.item(index).clone();
                table.items.as_ptr().add(index).write(item);
                table.set_control(index, *self.control.as_ptr().add(index));
                table.size += 1;
            }
        }
        if self.groups != 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    self.control.as_ptr(),
                    table.control.as_ptr(),
                    self.capacity(),
                );
            }
        }
        table
    }
}

impl<T> IntoIterator for RawTable<T> {
    type Item = T;
    type IntoIter = RawIntoIter<T>;

    fn into_iter(self) -> RawIntoIter<T> {
        RawIntoIter {
            slots: unsafe { FullSlots::new(self.control, self.groups, self.size) },
            table: self,
        }
    }
}

/// Indices of full slots, read one group at a time.
///
/// The mask of a group is taken when the walk enters it, so the caller may
/// rewrite control bytes of slots already yielded.
#[derive(Clone)]
pub(crate) struct FullSlots {
    control: NonNull<u8>,
    groups: usize,
    next_group: usize,
    offset: usize,
    current: BitMask,
    remaining: usize,
}

impl FullSlots {
    /// # Safety
    ///
    /// `control` must point at `groups * 16` control bytes that stay
    /// allocated while the iterator is used.
    unsafe fn new(control: NonNull<u8>, groups: usize, remaining: usize) -> Self {
        Self {
            control,
            groups,
            next_group: 0,
            offset: 0,
            current: BitMask(0),
            remaining,
        }
    }
}

impl Iterator for FullSlots {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(bit) = self.current.next() {
                self.remaining -= 1;
                return Some(self.offset + bit);
            }
            if self.next_group == self.groups {
                return None;
            }
            self.offset = self.next_group * GROUP_WIDTH;
            self.current = unsafe { Group::load(self.control.as_ptr().add(self.offset)) }.match_full();
            self.next_group += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

pub struct RawIter<'a, T> {
    slots: FullSlots,
    items: NonNull<T>,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for RawIter<'_, T> {}
unsafe impl<T: Sync> Sync for RawIter<'_, T> {}

impl<'a, T> Iterator for RawIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        let index = self.slots.next()?;
        Some(unsafe { &*self.items.as_ptr().add(index) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T> ExactSizeIterator for RawIter<'_, T> {}

impl<T> Clone for RawIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            items: self.items,
            _marker: PhantomData,
        }
    }
}

pub struct RawIterMut<'a, T> {
    slots: FullSlots,
    items: NonNull<T>,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for RawIterMut<'_, T> {}
unsafe impl<T: Sync> Sync for RawIterMut<'_, T> {}

impl<'a, T> Iterator for RawIterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        let index = self.slots.next()?;
        Some(unsafe { &mut *self.items.as_ptr().add(index) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T> ExactSizeIterator for RawIterMut<'_, T> {}

/// Moves items out of a table. Items not yielded are dropped with it.
pub struct RawIntoIter<T> {
    slots: FullSlots,
    table: RawTable<T>,
}

unsafe impl<T: Send> Send for RawIntoIter<T> {}
unsafe impl<T: Sync> Sync for RawIntoIter<T> {}

impl<T> Iterator for RawIntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        let index = self.slots.next()?;
        unsafe {
            self.table.set_control(index, EMPTY);
            self.table.size -= 1;
            Some(self.table.items.as_ptr().add(index).read())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T> ExactSizeIterator for RawIntoIter<T> {}
