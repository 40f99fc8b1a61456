// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Allocation accounting for the memory profiles.
//!
//! [`CountingAllocator`] wraps another global allocator and keeps a running
//! count of live bytes per thread. Measurements are taken through an
//! [`AllocationScope`]: a scope is opened fresh for every trial, records the
//! count at entry, reports the bytes allocated since, and on
//! [`finish`](AllocationScope::finish) requires that everything allocated
//! inside it has been released again.
//!
//! The binary installs the allocator:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator::system();
//! ```

use std::alloc::GlobalAlloc;
use std::alloc::Layout;
use std::alloc::System;
use std::cell::Cell;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::error::Error;
use crate::error::ErrorKind;

static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static LIVE_BYTES: Cell<i64> = const { Cell::new(0) };
}

/// A global allocator that counts live bytes per thread.
#[derive(Debug, Default)]
pub struct CountingAllocator<A = System> {
    inner: A,
}

impl CountingAllocator<System> {
    /// Counts allocations served by the system allocator.
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A> CountingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[inline]
fn record(delta: i64) {
    // try_with: the thread-local may already be gone during thread teardown
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + delta));
    if !INSTALLED.load(Ordering::Relaxed) {
        INSTALLED.store(true, Ordering::Relaxed);
    }
}

#[allow(unsafe_code)]
// SAFETY: every call is forwarded unchanged to the wrapped allocator; the
// wrapper only updates a counter around it.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            record(layout.size() as i64);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record(layout.size() as i64);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        record(-(layout.size() as i64));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record(new_size as i64 - layout.size() as i64);
        }
        new_ptr
    }
}

/// Returns true once a [`CountingAllocator`] has served an allocation in
/// this process.
pub fn allocator_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

fn live_bytes_on_thread() -> i64 {
    LIVE_BYTES.try_with(Cell::get).unwrap_or(0)
}

/// Allocation measurement of one region of code on the current thread.
///
/// A scope must be finished on the thread that entered it.
#[derive(Debug)]
#[must_use = "an allocation scope must be finished to check for leaks"]
pub struct AllocationScope {
    baseline: i64,
}

impl AllocationScope {
    pub fn enter() -> Self {
        Self {
            baseline: live_bytes_on_thread(),
        }
    }

    /// Bytes allocated and not yet released since the scope was entered.
    pub fn live_bytes(&self) -> i64 {
        live_bytes_on_thread() - self.baseline
    }

    /// Closes the scope, failing if any byte allocated inside it is still live.
    pub fn finish(self) -> Result<(), Error> {
        match self.live_bytes() {
            0 => Ok(()),
            leaked => Err(Error::new(
                ErrorKind::MemoryLeak,
                "tracked allocations did not return to zero",
            )
            .with_context("live_bytes", leaked)),
        }
    }
}
