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
// under the License..

//! The Untrusted-Stack Allocator (§4.2): a per-thread bump allocator over
//! a fixed slab of host memory, reset after every OCALL (invariant I2).
//! Grounded on `sgx_trts::call::ocalloc::{OcBuffer, OcAlloc}`, which bumps
//! a cursor down from `rsp_u` and probes pages as it grows; this version
//! bumps upward from a fixed per-thread base since the gateway owns a
//! dedicated slab rather than borrowing the raw host stack.

use core::cell::Cell;
use core::mem::{align_of, size_of};
use ocg_types::{ensure, GwError, GwResult};

/// A contiguous slab of host memory dedicated to one enclave thread's
/// untrusted-stack allocations.
pub struct UsaRegion {
    base: *mut u8,
    size: usize,
}

// SAFETY: `UsaRegion` is only ever handed to the one enclave thread it was
// allocated for; it is not shared.
unsafe impl Send for UsaRegion {}

impl UsaRegion {
    /// # Safety
    /// `base` must be valid for `size` writable bytes for the lifetime of
    /// the enclave thread this region belongs to, and must lie entirely
    /// outside the enclave (BMC's `entirely_outside`).
    pub unsafe fn new(base: *mut u8, size: usize) -> Self {
        UsaRegion { base, size }
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Per-thread bump allocator over a [`UsaRegion`]. `alloc`/`reset` are the
/// only two operations; there is no free for an individual allocation —
/// the whole frame goes away at once when the OCALL returns (I2).
pub struct Usa {
    base: *mut u8,
    size: usize,
    cursor: Cell<usize>,
}

impl Usa {
    pub fn new(region: &UsaRegion) -> Self {
        Usa {
            base: region.as_ptr(),
            size: region.size(),
            cursor: Cell::new(0),
        }
    }

    /// Bytes already bumped past in the current frame.
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    pub fn remaining(&self) -> usize {
        self.size - self.cursor.get()
    }

    /// Bumps the cursor by `layout`-aligned `size` bytes and returns the
    /// host-resident slice. Fails with [`GwError::Permission`] on
    /// exhaustion rather than ever falling back to enclave memory (§4.2:
    /// "allocation never succeeds by falling back to enclave-resident
    /// memory").
    pub fn alloc(&self, size: usize, align: usize) -> GwResult<*mut u8> {
        ensure!(align.is_power_of_two(), GwError::invalid("align must be a power of two"));
        let cur = self.cursor.get();
        let aligned = (cur + align - 1) & !(align - 1);
        let end = aligned.checked_add(size).ok_or(GwError::permission("usa: size overflow"))?;
        ensure!(end <= self.size, GwError::permission("usa exhausted"));
        self.cursor.set(end);
        Ok(unsafe { self.base.add(aligned) })
    }

    /// Typed convenience over [`alloc`](Self::alloc).
    pub fn alloc_typed<T>(&self) -> GwResult<*mut T> {
        Ok(self.alloc(size_of::<T>(), align_of::<T>())? as *mut T)
    }

    /// Copies `data` into a freshly bumped host-resident buffer and
    /// returns it, for marshaling enclave-owned input buffers out to the
    /// host (§4.2, §6: the gateway copies request bytes into the USA
    /// frame before handing the host a pointer to them).
    ///
    /// # Safety
    /// `data` must be entirely enclave-resident; the caller is expected to
    /// have gone through [`crate::bmc::entirely_inside`] already.
    pub unsafe fn copy_in_from_enclave(&self, data: &[u8]) -> GwResult<*mut u8> {
        let dst = self.alloc(data.len(), 1)?;
        if !data.is_empty() {
            core::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        Ok(dst)
    }

    /// Rewinds the cursor to zero, releasing the whole frame at once.
    /// Invariant I2 requires this happen after *every* OCALL, which is why
    /// callers are expected to drive it through [`UsaFrame`] rather than
    /// calling it directly.
    fn reset(&self) {
        self.cursor.set(0);
    }
}

/// RAII guard enforcing I2: borrows a [`Usa`] for the duration of one
/// OCALL and resets it on drop, including on early return or panic
/// unwinding through the gateway's dispatch path.
pub struct UsaFrame<'a> {
    usa: &'a Usa,
}

impl<'a> UsaFrame<'a> {
    pub fn open(usa: &'a Usa) -> Self {
        debug_assert_eq!(usa.used(), 0, "usa frame opened while a prior frame is still live");
        UsaFrame { usa }
    }

    pub fn usa(&self) -> &Usa {
        self.usa
    }
}

impl Drop for UsaFrame<'_> {
    fn drop(&mut self) {
        self.usa.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_usa(buf: &mut [u8]) -> Usa {
        let region = unsafe { UsaRegion::new(buf.as_mut_ptr(), buf.len()) };
        Usa::new(&region)
    }

    #[test]
    fn alloc_bumps_and_aligns() {
        let mut buf = [0u8; 64];
        let usa = make_usa(&mut buf);
        let p1 = usa.alloc(3, 1).unwrap();
        let p2 = usa.alloc(8, 8).unwrap();
        assert_eq!(p2 as usize % 8, 0);
        assert!((p2 as usize) > (p1 as usize));
    }

    #[test]
    fn alloc_fails_on_exhaustion_never_falls_back() {
        let mut buf = [0u8; 16];
        let usa = make_usa(&mut buf);
        assert!(usa.alloc(16, 1).is_ok());
        let result = usa.alloc(1, 1);
        assert!(matches!(result, Err(GwError::Permission(_))));
    }

    #[test]
    fn frame_resets_cursor_on_drop() {
        let mut buf = [0u8; 32];
        let usa = make_usa(&mut buf);
        {
            let frame = UsaFrame::open(&usa);
            frame.usa().alloc(16, 1).unwrap();
            assert_eq!(usa.used(), 16);
        }
        assert_eq!(usa.used(), 0);
    }

    #[test]
    fn frame_resets_even_on_early_return() {
        let mut buf = [0u8; 32];
        let usa = make_usa(&mut buf);
        fn do_work(usa: &Usa) -> GwResult {
            let _frame = UsaFrame::open(usa);
            usa.alloc(8, 1)?;
            Err(GwError::permission("simulated mid-ocall failure"))
        }
        let _ = do_work(&usa);
        assert_eq!(usa.used(), 0);
    }
}
