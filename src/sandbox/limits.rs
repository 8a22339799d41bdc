//! Memory limiting for QuickJS runtimes.
//!
//! Every arena's runtime allocates through a [`SandboxLimiter`]. The limiter
//! refuses any allocation that would take the heap past the ceiling and
//! records that it did, so the session can report the breach even when the
//! script caught the resulting `InternalError`.

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rquickjs::allocator::{Allocator, RawMemPtr, RustAllocator};

/// Heap accounting shared between a limiter and its arena.
#[derive(Debug)]
pub struct MemoryMeter {
    /// Maximum heap size in bytes.
    max_memory: usize,
    current_memory: AtomicUsize,
    peak_memory: AtomicUsize,
    limit_exceeded: AtomicBool,
}

impl MemoryMeter {
    /// Create a meter with the given ceiling.
    pub fn new(max_memory: usize) -> Self {
        Self {
            max_memory,
            current_memory: AtomicUsize::new(0),
            peak_memory: AtomicUsize::new(0),
            limit_exceeded: AtomicBool::new(false),
        }
    }

    /// Whether an allocation has ever been refused.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded.load(Ordering::SeqCst)
    }

    /// Bytes currently allocated.
    pub fn current_memory(&self) -> usize {
        self.current_memory.load(Ordering::Relaxed)
    }

    /// Highest allocation ever observed.
    pub fn peak_memory(&self) -> usize {
        self.peak_memory.load(Ordering::Relaxed)
    }

    /// The configured ceiling.
    pub fn max_memory(&self) -> usize {
        self.max_memory
    }

    /// Check whether `extra` more bytes fit under the ceiling.
    fn admit(&self, extra: usize) -> bool {
        let desired = self.current_memory().saturating_add(extra);
        if desired > self.max_memory {
            self.limit_exceeded.store(true, Ordering::SeqCst);
            return false;
        }
        true
    }

    fn grow(&self, bytes: usize) {
        let current = self.current_memory.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_memory.fetch_max(current, Ordering::Relaxed);
    }

    fn shrink(&self, bytes: usize) {
        self.current_memory.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Allocator that enforces a [`MemoryMeter`]'s ceiling.
pub struct SandboxLimiter {
    meter: Arc<MemoryMeter>,
}

impl SandboxLimiter {
    /// Create a limiter reporting to `meter`.
    pub fn new(meter: Arc<MemoryMeter>) -> Self {
        Self { meter }
    }
}

unsafe impl Allocator for SandboxLimiter {
    fn alloc(&mut self, size: usize) -> RawMemPtr {
        if !self.meter.admit(size) {
            return ptr::null_mut();
        }
        let ptr = RustAllocator.alloc(size);
        if !ptr.is_null() {
            self.meter.grow(unsafe { RustAllocator::usable_size(ptr) });
        }
        ptr
    }

    unsafe fn dealloc(&mut self, ptr: RawMemPtr) {
        self.meter.shrink(unsafe { RustAllocator::usable_size(ptr) });
        unsafe { RustAllocator.dealloc(ptr) };
    }

    unsafe fn realloc(&mut self, ptr: RawMemPtr, new_size: usize) -> RawMemPtr {
        let old_size = unsafe { RustAllocator::usable_size(ptr) };
        if new_size > old_size && !self.meter.admit(new_size - old_size) {
            return ptr::null_mut();
        }
        let new_ptr = unsafe { RustAllocator.realloc(ptr, new_size) };
        if !new_ptr.is_null() {
            self.meter.shrink(old_size);
            self.meter.grow(unsafe { RustAllocator::usable_size(new_ptr) });
        }
        new_ptr
    }

    unsafe fn usable_size(ptr: RawMemPtr) -> usize
    where
        Self: Sized,
    {
        unsafe { RustAllocator::usable_size(ptr) }
    }
}
