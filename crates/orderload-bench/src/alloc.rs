//! Allocation accounting.
//!
//! [`CountingAllocator`] wraps another global allocator and tallies every
//! allocation into process-wide counters. A binary opts in by installing it
//! as its `#[global_allocator]`; without it the counters stay at zero and the
//! harness reports zero allocated bytes.

use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// Allocator backing the counting allocator in the default build.
#[cfg(feature = "mimalloc")]
pub type BaseAllocator = mimalloc::MiMalloc;

/// Allocator backing the counting allocator in the default build.
#[cfg(not(feature = "mimalloc"))]
pub type BaseAllocator = std::alloc::System;

/// Instance of [`BaseAllocator`] usable in a `static`.
#[cfg(feature = "mimalloc")]
pub const BASE_ALLOCATOR: BaseAllocator = mimalloc::MiMalloc;

/// Instance of [`BaseAllocator`] usable in a `static`.
#[cfg(not(feature = "mimalloc"))]
pub const BASE_ALLOCATOR: BaseAllocator = std::alloc::System;

/// Global allocator that counts bytes handed out by `inner`.
///
/// Deallocations are not subtracted: the counters measure total allocation
/// traffic, not live memory.
pub struct CountingAllocator<A> {
    inner: A,
}

impl<A> CountingAllocator<A> {
    /// Wrap `inner`.
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[inline]
fn record(bytes: usize) {
    ALLOCATED_BYTES.fetch_add(bytes as u64, Ordering::Relaxed);
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            record(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            record(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.inner.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            // Only growth counts as new allocation.
            record(new_size.saturating_sub(layout.size()));
        }
        new_ptr
    }
}

/// Point-in-time reading of the allocation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationSnapshot {
    pub bytes: u64,
    pub allocations: u64,
}

impl AllocationSnapshot {
    /// Read the counters now.
    pub fn now() -> Self {
        Self {
            bytes: ALLOCATED_BYTES.load(Ordering::Relaxed),
            allocations: ALLOCATIONS.load(Ordering::Relaxed),
        }
    }

    /// Counter growth since `self`.
    pub fn elapsed(&self) -> AllocationSnapshot {
        let now = Self::now();
        AllocationSnapshot {
            bytes: now.bytes.saturating_sub(self.bytes),
            allocations: now.allocations.saturating_sub(self.allocations),
        }
    }
}

/// Total bytes allocated through a [`CountingAllocator`] so far.
pub fn allocated_bytes() -> u64 {
    ALLOCATED_BYTES.load(Ordering::Relaxed)
}
