//! One allocation per table: `groups * 16` control bytes, padding, then
//! `groups * 16` item slots.

use crate::control::{EMPTY, GROUP_WIDTH};
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ptr::NonNull;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLayout<T> {
    /// Byte offset of the first item.
    pub items_offset: usize,
    pub layout: Layout,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TableLayout<T> {
    /// # Panics
    ///
    /// Panics if the total size overflows `isize`.
    pub fn new(groups: usize) -> Self {
        let align = std::cmp::max(align_of::<T>(), GROUP_WIDTH);
        let slots = groups.checked_mul(GROUP_WIDTH).expect("capacity overflow");
        let padding = padding_for::<T>(slots);
        let items_offset = slots + padding;
        let size = slots
            .checked_mul(size_of::<T>())
            .and_then(|items| items.checked_add(items_offset))
            .expect("capacity overflow");
        let layout = Layout::from_size_align(size, align).expect("capacity overflow");
        Self {
            items_offset,
            layout,
            _marker: PhantomData,
        }
    }
}

/// Bytes needed after `control_len` control bytes to align the item array.
#[inline(always)]
pub fn padding_for<T>(control_len: usize) -> usize {
    let align = align_of::<T>();
    (align - control_len % align) % align
}

/// Start of a table allocation.
pub struct Allocation<T> {
    pub control: NonNull<u8>,
    pub items: NonNull<T>,
}

/// Allocates storage for `groups` groups with every control byte EMPTY.
/// Items are left uninitialized.
///
/// Allocation failure aborts through `handle_alloc_error`.
pub fn allocate<T>(groups: usize) -> Allocation<T> {
    debug_assert!(groups.is_power_of_two());
    let table = TableLayout::<T>::new(groups);
    unsafe {
        let base = match NonNull::new(alloc(table.layout)) {
            Some(base) => base,
            None => handle_alloc_error(table.layout),
        };
        base.as_ptr().write_bytes(EMPTY, groups * GROUP_WIDTH);
        let items = NonNull::new_unchecked(base.as_ptr().add(table.items_offset) as *mut T);
        Allocation {
            control: base,
            items,
        }
    }
}

/// # Safety
///
/// `control` must come from `allocate::<T>(groups)` with the same `groups`,
/// and every item in it must already be dropped or moved out.
pub unsafe fn deallocate<T>(groups: usize, control: NonNull<u8>) {
    let table = TableLayout::<T>::new(groups);
    dealloc(control.as_ptr(), table.layout);
}
