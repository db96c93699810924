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

//! The bulk-I/O scratch buffer (§4.5 point 4): a buffer that lives on the
//! USA when it fits, and falls back to a host-heap `mmap_untrusted`
//! mapping when it doesn't, released on every exit path the same way
//! `UsaFrame` releases the USA itself (design note §9's "scoped resource"
//! treatment, generalized from the USA to this second scratch resource).

use ocg_types::{GwResult, HostPtr};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

/// Per-thread untrusted stack size the gateway assumes when sizing the
/// large-I/O cutover (§4.5 point 4: "concretely 512 KiB").
pub const THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Buffers at or under this size are carved out of the USA frame; larger
/// ones are mapped directly out of the host heap via `mmap_untrusted`.
pub const MAX_UNTRUSTED_STACK_BUF: usize = THREAD_STACK_SIZE / 4;

/// A host-resident scratch buffer for one OCALL's bulk I/O. Freed on drop:
/// a no-op if it came from the USA (the enclosing `UsaFrame` reclaims it),
/// or an `munmap_untrusted` OCALL if it was heap-mapped.
pub struct BulkBuffer<'g, 'a, H: DirectExit> {
    gateway: &'g Gateway<'a, H>,
    ptr: HostPtr<u8>,
    len: usize,
    heap: bool,
}

impl<'g, 'a, H: DirectExit> BulkBuffer<'g, 'a, H> {
    /// Acquires `len` bytes of host-resident scratch space, choosing USA
    /// or host-heap per `MAX_UNTRUSTED_STACK_BUF`. This decision, and the
    /// resulting allocation, must complete before the caller builds any
    /// args struct that references the buffer (§4.5 point 4).
    pub fn acquire(gateway: &'g Gateway<'a, H>, len: usize) -> GwResult<Self> {
        if len <= MAX_UNTRUSTED_STACK_BUF {
            let raw = gateway.usa_alloc(len)?;
            let ptr = ocg_trts::bmc::classify_host(raw)?;
            Ok(BulkBuffer {
                gateway,
                ptr,
                len,
                heap: false,
            })
        } else {
            log::trace!(
                "buffer of {} bytes exceeds the {}-byte USA budget, mapping host heap",
                len,
                MAX_UNTRUSTED_STACK_BUF
            );
            let ptr = gateway.raw_mmap_untrusted(len)?;
            Ok(BulkBuffer {
                gateway,
                ptr,
                len,
                heap: true,
            })
        }
    }

    pub fn host_ptr(&self) -> HostPtr<u8> {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<'g, 'a, H: DirectExit> Drop for BulkBuffer<'g, 'a, H> {
    fn drop(&mut self) {
        if self.heap {
            if let Err(e) = self.gateway.raw_munmap_untrusted(self.ptr, self.len) {
                log::error!("failed to unmap bulk host buffer: {}", e);
            }
        }
    }
}
