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

//! Test-only harness standing in for real enclave hardware: two heap
//! allocations play the part of enclave and host memory so the gateway's
//! boundary logic can be exercised under `#[cfg(test)]` without an SGX
//! loader (§8: the six listed scenarios are all expressible this way).
//!
//! This mirrors the role `sgx_tests` plays for the real SDK, minus the
//! enclave: there, tests run on real hardware because the SDK's
//! correctness depends on the real EENTER/EEXIT transition; here, BMC and
//! USA operate purely on address ranges the caller supplies, so plain
//! heap buffers are a faithful stand-in.

extern crate std;

use crate::bmc::{self, Regions};
use std::boxed::Box;
use std::vec;

/// Leaked enclave/host buffers registered with [`crate::bmc`] for the
/// lifetime of the test process. Leaking is deliberate: BMC's `Regions`
/// are a `'static` `OnceCell` and are never unset, matching production
/// where the regions live for the life of the enclave.
pub struct SimulatedBoundary {
    enclave_len: usize,
    host_len: usize,
    enclave_base: *mut u8,
    host_base: *mut u8,
}

impl SimulatedBoundary {
    /// Installs a fresh pair of regions sized generously for test use.
    /// `bmc::init_regions` keys this off a thread-local in test builds, so
    /// calling `install`/`with_sizes` more than once *within the same
    /// test's thread* simply replaces the region the previous call
    /// registered; calling it from a different test is always safe since
    /// each `#[test]` runs on its own freshly spawned thread.
    pub fn install() -> Self {
        Self::with_sizes(4096, 4096)
    }

    pub fn with_sizes(enclave_len: usize, host_len: usize) -> Self {
        let enclave: Box<[u8]> = vec![0u8; enclave_len].into_boxed_slice();
        let host: Box<[u8]> = vec![0u8; host_len].into_boxed_slice();
        let enclave_base = Box::into_raw(enclave) as *mut u8;
        let host_base = Box::into_raw(host) as *mut u8;

        bmc::init_regions(Regions {
            enclave_base: enclave_base as usize,
            enclave_size: enclave_len,
            host_base: host_base as usize,
            host_size: host_len,
        });

        SimulatedBoundary {
            enclave_len,
            host_len,
            enclave_base,
            host_base,
        }
    }

    pub fn enclave_len(&self) -> usize {
        self.enclave_len
    }

    pub fn host_len(&self) -> usize {
        self.host_len
    }

    pub fn enclave_ptr(&self, offset: usize) -> *const u8 {
        unsafe { self.enclave_base.add(offset) }
    }

    pub fn enclave_ptr_mut(&self, offset: usize) -> *mut u8 {
        unsafe { self.enclave_base.add(offset) }
    }

    pub fn host_ptr(&self, offset: usize) -> *const u8 {
        unsafe { self.host_base.add(offset) }
    }

    pub fn host_ptr_mut(&self, offset: usize) -> *mut u8 {
        unsafe { self.host_base.add(offset) }
    }

    /// A pointer straddling the boundary of the enclave region, useful for
    /// exercising the straddling-pointer rejection path directly rather
    /// than reasoning about it via `enclave_len - k`.
    pub fn straddling_enclave_tail(&self, overhang: usize) -> *const u8 {
        self.enclave_ptr(self.enclave_len.saturating_sub(overhang / 2))
    }
}
