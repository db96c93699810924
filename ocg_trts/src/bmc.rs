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

//! The Boundary Memory Checker (§4.1).
//!
//! `entirely_inside`/`entirely_outside` classify a pointer range against
//! the pair of fixed regions established at enclave creation; a region
//! touching both is "straddling" and every BMC operation rejects it. This
//! module is the *only* place `HostPtr`/`EnclavePtr` values are minted —
//! nothing upstream of here gets to assert a classification without BMC
//! having checked it.

use crate::once::OnceCell;
use ocg_types::{ensure, EnclavePtr, GwError, GwResult, HostPtr};

#[cfg(any(test, feature = "test-support"))]
extern crate std;

/// The pair of fixed, disjoint address ranges established at enclave
/// creation (§3). In production this is populated once from the loader's
/// layout; tests populate it from `test_support::SimulatedBoundary`.
#[derive(Clone, Copy, Debug)]
pub struct Regions {
    pub enclave_base: usize,
    pub enclave_size: usize,
    pub host_base: usize,
    pub host_size: usize,
}

impl Regions {
    fn enclave_range(&self) -> (usize, usize) {
        (self.enclave_base, self.enclave_base + self.enclave_size)
    }

    fn host_range(&self) -> (usize, usize) {
        (self.host_base, self.host_base + self.host_size)
    }
}

static REGIONS: OnceCell<Regions> = OnceCell::new();

/// Thread-local override used only by test/`test-support` builds. The
/// default test harness runs every `#[test]` on its own freshly spawned
/// thread, so keying the simulated boundary off a thread-local instead of
/// the process-wide `REGIONS` cell gives each test (and each
/// `SimulatedBoundary::with_sizes` call within it) an isolated region pair
/// instead of every test after the first racing to reuse whichever
/// addresses the first test in the binary happened to register.
#[cfg(any(test, feature = "test-support"))]
std::thread_local! {
    static TEST_REGIONS: core::cell::Cell<Option<Regions>> = core::cell::Cell::new(None);
}

/// Sets the enclave/host regions once, at enclave initialization. Returns
/// `false` if already set (idempotent no-op, never a silent overwrite).
#[cfg(not(any(test, feature = "test-support")))]
pub fn init_regions(regions: Regions) -> bool {
    REGIONS.set(regions)
}

/// Test builds may re-register a fresh region pair per test: see
/// [`TEST_REGIONS`].
#[cfg(any(test, feature = "test-support"))]
pub fn init_regions(regions: Regions) -> bool {
    TEST_REGIONS.with(|cell| cell.set(Some(regions)));
    true
}

#[cfg(not(any(test, feature = "test-support")))]
fn regions() -> Regions {
    *REGIONS
        .get()
        .expect("ocg_trts::bmc used before init_regions")
}

#[cfg(any(test, feature = "test-support"))]
fn regions() -> Regions {
    TEST_REGIONS
        .with(|cell| cell.get())
        .expect("ocg_trts::bmc used before init_regions")
}

fn range_within(start: usize, end: usize, lo: usize, hi: usize) -> bool {
    start <= end && start >= lo && end <= hi
}

fn span(p: *const u8, n: usize) -> Option<(usize, usize)> {
    let start = p as usize;
    if n == 0 {
        return Some((start, start));
    }
    let end = start.checked_add(n)?;
    Some((start, end))
}

/// True iff the `n`-byte region at `p` lies entirely inside the enclave
/// region.
pub fn entirely_inside(p: *const u8, n: usize) -> bool {
    match span(p, n) {
        Some((start, end)) => {
            let (lo, hi) = regions().enclave_range();
            range_within(start, end, lo, hi)
        }
        None => false,
    }
}

/// True iff the `n`-byte region at `p` lies entirely inside the host
/// region.
pub fn entirely_outside(p: *const u8, n: usize) -> bool {
    match span(p, n) {
        Some((start, end)) => {
            let (lo, hi) = regions().host_range();
            range_within(start, end, lo, hi)
        }
        None => false,
    }
}

/// True iff the region touches both the enclave and host regions, or
/// touches neither — anything BMC will never hand out a typed pointer
/// for.
pub fn straddles(p: *const u8, n: usize) -> bool {
    !entirely_inside(p, n) && !entirely_outside(p, n)
}

/// Copies `n` bytes from host memory into an enclave-resident destination.
/// Fails unless `dst` is entirely inside, `src` is entirely outside, and
/// `n <= dst_cap`.
///
/// # Safety
/// `dst` must be valid for `dst_cap` writable bytes and `src` for `n`
/// readable bytes; the two must not overlap (they can't, since they are on
/// opposite sides of the boundary whenever this returns `Ok`).
pub unsafe fn copy_to_enclave(
    dst: *mut u8,
    dst_cap: usize,
    src: *const u8,
    n: usize,
) -> GwResult<usize> {
    ensure!(n <= dst_cap, GwError::permission("dst_cap exceeded"));
    ensure!(
        entirely_inside(dst, dst_cap),
        GwError::permission("copy_to_enclave: dst not entirely inside enclave")
    );
    ensure!(
        entirely_outside(src, n),
        GwError::permission("copy_to_enclave: src not entirely outside enclave")
    );
    core::ptr::copy_nonoverlapping(src, dst, n);
    Ok(n)
}

/// Symmetric to [`copy_to_enclave`]: copies `n` bytes from an
/// enclave-resident source into host memory.
///
/// # Safety
/// `dst` must be valid for `n` writable bytes and `src` for `n` readable
/// bytes.
pub unsafe fn copy_to_host(dst: *mut u8, src: *const u8, n: usize) -> GwResult<()> {
    ensure!(
        entirely_outside(dst, n),
        GwError::permission("copy_to_host: dst not entirely outside enclave")
    );
    ensure!(
        entirely_inside(src, n),
        GwError::permission("copy_to_host: src not entirely inside enclave")
    );
    core::ptr::copy_nonoverlapping(src, dst, n);
    Ok(())
}

/// Classifies a raw host pointer and, only if it is entirely outside the
/// enclave, hands back a typed [`HostPtr`].
pub fn classify_host<T>(ptr: *mut T) -> GwResult<HostPtr<T>> {
    let n = core::mem::size_of::<T>();
    ensure!(
        entirely_outside(ptr as *const u8, n),
        GwError::permission("pointer is not entirely outside the enclave")
    );
    Ok(unsafe { HostPtr::new_unchecked(ptr) })
}

/// Classifies a raw enclave pointer and, only if it is entirely inside the
/// enclave, hands back a typed [`EnclavePtr`].
pub fn classify_enclave<T>(ptr: *mut T) -> GwResult<EnclavePtr<T>> {
    let n = core::mem::size_of::<T>();
    ensure!(
        entirely_inside(ptr as *const u8, n),
        GwError::permission("pointer is not entirely inside the enclave")
    );
    Ok(unsafe { EnclavePtr::new_unchecked(ptr) })
}

/// Assigns a host pointer into an enclave-resident variable only after
/// verifying the pointed-to region is entirely outside (§4.1:
/// `copy_ptr_to_enclave`).
///
/// # Safety
/// `out` must be a valid, writable enclave-resident location.
pub unsafe fn copy_ptr_to_enclave<T>(out: *mut HostPtr<T>, host_ptr: *mut T, n: usize) -> GwResult {
    ensure!(
        entirely_outside(host_ptr as *const u8, n),
        GwError::permission("copy_ptr_to_enclave: pointee not entirely outside enclave")
    );
    ensure!(
        entirely_inside(out as *const u8, core::mem::size_of::<HostPtr<T>>()),
        GwError::permission("copy_ptr_to_enclave: out is not enclave-resident")
    );
    out.write(HostPtr::new_unchecked(host_ptr));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SimulatedBoundary;

    #[test]
    fn entirely_inside_rejects_straddling() {
        let boundary = SimulatedBoundary::install();
        let enclave_ptr = boundary.enclave_ptr(boundary.enclave_len() - 4);
        assert!(!entirely_inside(enclave_ptr, 16));
        assert!(straddles(enclave_ptr, 16));
    }

    #[test]
    fn entirely_inside_and_outside_are_mutually_exclusive() {
        let boundary = SimulatedBoundary::install();
        let e = boundary.enclave_ptr(0);
        let h = boundary.host_ptr(0);
        assert!(entirely_inside(e, 8) && !entirely_outside(e, 8));
        assert!(entirely_outside(h, 8) && !entirely_inside(h, 8));
    }

    #[test]
    fn copy_to_enclave_rejects_straddling_src() {
        let boundary = SimulatedBoundary::install();
        let straddling = boundary.enclave_ptr(boundary.enclave_len() - 4);
        let mut dst = [0u8; 16];
        let result =
            unsafe { copy_to_enclave(dst.as_mut_ptr(), dst.len(), straddling, 16) };
        assert!(matches!(result, Err(GwError::Permission(_))));
    }

    #[test]
    fn copy_to_enclave_clamps_to_capacity() {
        let boundary = SimulatedBoundary::install();
        let src = boundary.host_ptr(0);
        let mut dst = [0u8; 4];
        let result = unsafe { copy_to_enclave(dst.as_mut_ptr(), dst.len(), src, 8) };
        assert!(matches!(result, Err(GwError::Permission(_))));
    }
}

#[cfg(test)]
mod proptests {
    extern crate std;

    use super::*;
    use crate::test_support::SimulatedBoundary;
    use proptest::prelude::*;

    proptest! {
        /// P1 Isolation: any sub-range that fits entirely within the
        /// enclave region classifies as inside and never as outside or
        /// straddling, for every offset/length the region can hold.
        #[test]
        fn any_in_bounds_enclave_range_classifies_inside(
            offset in 0usize..4096,
            len in 0usize..4096,
        ) {
            let boundary = SimulatedBoundary::with_sizes(4096, 4096);
            prop_assume!(offset + len <= boundary.enclave_len());
            let p = boundary.enclave_ptr(offset);
            prop_assert!(entirely_inside(p, len));
            prop_assert!(!entirely_outside(p, len));
            prop_assert!(!straddles(p, len));
        }

        /// Symmetric to the above for the host region.
        #[test]
        fn any_in_bounds_host_range_classifies_outside(
            offset in 0usize..4096,
            len in 0usize..4096,
        ) {
            let boundary = SimulatedBoundary::with_sizes(4096, 4096);
            prop_assume!(offset + len <= boundary.host_len());
            let p = boundary.host_ptr(offset);
            prop_assert!(entirely_outside(p, len));
            prop_assert!(!entirely_inside(p, len));
            prop_assert!(!straddles(p, len));
        }

        /// Any range that runs past the end of the enclave region, however
        /// short the overhang, is rejected rather than silently truncated.
        #[test]
        fn overhanging_enclave_range_never_classifies_inside(
            overhang in 1usize..256,
            len in 1usize..512,
        ) {
            let boundary = SimulatedBoundary::with_sizes(4096, 4096);
            let offset = boundary.enclave_len().saturating_sub(overhang);
            prop_assume!(offset + len > boundary.enclave_len());
            let p = boundary.enclave_ptr(offset);
            prop_assert!(!entirely_inside(p, len));
        }
    }
}
