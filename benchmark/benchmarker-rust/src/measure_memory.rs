use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Global allocator that keeps a running total of live bytes.
pub struct MeasureMemory {
    count: AtomicUsize,
}

impl MeasureMemory {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    pub fn measure(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for MeasureMemory {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for MeasureMemory {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            self.count
                .fetch_add(layout.pad_to_align().size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.count
            .fetch_sub(layout.pad_to_align().size(), Ordering::Relaxed);
        System.dealloc(ptr, layout);
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            self.count
                .fetch_add(layout.pad_to_align().size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let new_layout = Layout::from_size_align_unchecked(new_size, layout.align());
            self.count
                .fetch_sub(layout.pad_to_align().size(), Ordering::Relaxed);
            self.count
                .fetch_add(new_layout.pad_to_align().size(), Ordering::Relaxed);
        }
        new_ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_live_bytes() {
        let measure = MeasureMemory::new();
        unsafe {
            let layout = Layout::from_size_align(100, 16).unwrap();
            let ptr = measure.alloc(layout);
            assert_eq!(measure.measure(), 112);
            let ptr = measure.realloc(ptr, layout, 200);
            assert_eq!(measure.measure(), 208);
            measure.dealloc(ptr, Layout::from_size_align(200, 16).unwrap());
        }
        assert_eq!(measure.measure(), 0);
    }
}
