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

//! The Gateway proper (§4.5): one `Gateway` borrows the calling enclave
//! thread's [`Usa`] and its [`DirectExit`] boundary transition for the
//! duration of a call tree rooted at one of the `pub fn` operations in
//! [`crate::ops`]. Every operation opens its own [`UsaFrame`] (I2), builds
//! its args struct on the USA, dispatches through [`Gateway::exitless_ocall`],
//! and reads its outputs back out of the same args struct.

use core::mem::{align_of, size_of};
use core::sync::atomic::AtomicU32;

use ocg_sync::xbl::FutexWait;
use ocg_sync::RequestDescriptor;
use ocg_trts::bmc;
use ocg_trts::usa::Usa;
use ocg_types::error::EAGAIN;
use ocg_types::wire::FutexArgs;
use ocg_types::{ensure, GwError, GwResult, HostPtr, OCallCode};

use crate::buffer::BulkBuffer;
use crate::direct_exit::DirectExit;

/// Borrows one enclave thread's USA and boundary-transition primitive for
/// the lifetime of a call tree. Cheap to construct; intended to be built
/// fresh at OCALL entry rather than held across calls.
pub struct Gateway<'a, H: DirectExit> {
    pub(crate) usa: &'a Usa,
    pub(crate) host: &'a H,
}

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn new(usa: &'a Usa, host: &'a H) -> Self {
        Gateway { usa, host }
    }

    pub(crate) fn usa_alloc(&self, len: usize) -> GwResult<*mut u8> {
        self.usa.alloc(len, 1)
    }

    pub(crate) fn usa_alloc_aligned<T>(&self, n: usize) -> GwResult<*mut T> {
        Ok(self.usa.alloc(n * size_of::<T>(), align_of::<T>())? as *mut T)
    }

    /// Copies a caller-supplied, NUL-terminated enclave string onto the
    /// USA (§4.5 point 3: "null-terminated strings with their terminator
    /// included"), returning the host-resident copy and its length
    /// (terminator included).
    pub(crate) fn copy_in_cstr(&self, s: &[u8]) -> GwResult<(HostPtr<u8>, usize)> {
        ensure!(
            s.last() == Some(&0),
            GwError::invalid("path argument must be NUL-terminated")
        );
        ensure!(
            bmc::entirely_inside(s.as_ptr(), s.len()),
            GwError::permission("path argument is not entirely enclave-resident")
        );
        let host_ptr = unsafe { self.usa.copy_in_from_enclave(s)? };
        Ok((bmc::classify_host(host_ptr)?, s.len()))
    }

    /// Marshals a caller-supplied output buffer per §4.5.7's write/send
    /// rule: zero-copy if already host-resident, USA-copy if small and
    /// enclave-resident, heap-mapped memcpy if large and enclave-resident,
    /// rejected if it straddles. The returned `BulkBuffer`, if any, must
    /// outlive the dispatch that references it.
    pub(crate) fn marshal_output_buffer(
        &self,
        buf: *const u8,
        len: usize,
    ) -> GwResult<(HostPtr<u8>, Option<BulkBuffer<'_, 'a, H>>)> {
        if len == 0 {
            return Ok((HostPtr::null(), None));
        }
        if bmc::entirely_outside(buf, len) {
            return Ok((bmc::classify_host(buf as *mut u8)?, None));
        }
        ensure!(
            bmc::entirely_inside(buf, len),
            GwError::permission("buffer straddles the enclave boundary")
        );
        if len <= crate::buffer::MAX_UNTRUSTED_STACK_BUF {
            let p =
                unsafe { self.usa.copy_in_from_enclave(core::slice::from_raw_parts(buf, len))? };
            Ok((bmc::classify_host(p)?, None))
        } else {
            let bulk = BulkBuffer::acquire(self, len)?;
            unsafe {
                bmc::copy_to_host(bulk.host_ptr().as_ptr(), buf, len)?;
            }
            let ptr = bulk.host_ptr();
            Ok((ptr, Some(bulk)))
        }
    }

    pub(crate) fn raw_mmap_untrusted(&self, len: usize) -> GwResult<HostPtr<u8>> {
        let args_ptr = self.usa.alloc_typed::<ocg_types::wire::MmapUntrustedArgs>()?;
        unsafe {
            args_ptr.write(ocg_types::wire::MmapUntrustedArgs {
                len,
                ret_addr: HostPtr::null(),
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::MmapUntrusted, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let addr = unsafe { (*args_ptr).ret_addr };
        ensure!(
            !addr.is_null(),
            GwError::permission("mmap_untrusted returned a null address")
        );
        ensure!(
            bmc::entirely_outside(addr.as_ptr(), len),
            GwError::permission("mmap_untrusted returned a region not entirely outside the enclave")
        );
        log::trace!("mmap_untrusted mapped {} host bytes", len);
        Ok(addr)
    }

    pub(crate) fn raw_munmap_untrusted(&self, addr: HostPtr<u8>, len: usize) -> GwResult<()> {
        ensure!(
            bmc::entirely_outside(addr.as_ptr(), len),
            GwError::invalid("munmap_untrusted: region is not entirely outside the enclave")
        );
        let args_ptr = self.usa.alloc_typed::<ocg_types::wire::MunmapUntrustedArgs>()?;
        unsafe {
            args_ptr.write(ocg_types::wire::MunmapUntrustedArgs { addr, len });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::MunmapUntrusted, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    /// The core dispatch decision (§4.5 point 5): enqueue onto the ERQ and
    /// wait via XBL if a queue is configured and the code is exitless-
    /// eligible, otherwise (or on a full queue) perform a direct
    /// enclave-exit. Returns the host dispatcher's generic completion
    /// status: non-negative on success, `-errno` on failure. Per-operation
    /// payload values live in the args struct's own output fields, not in
    /// this status.
    pub(crate) fn exitless_ocall(&self, code: OCallCode, args: HostPtr<u8>) -> GwResult<i32> {
        if !code.is_exitless_eligible() {
            return self.host.ocall(code, args);
        }
        let queue = match ocg_sync::queue() {
            Some(q) => q,
            None => return self.host.ocall(code, args),
        };

        let rd_ptr = self.usa.alloc_typed::<RequestDescriptor>()?;
        unsafe {
            rd_ptr.write(RequestDescriptor::new(code, args));
        }
        let rd_host = bmc::classify_host(rd_ptr)?;

        match queue.enqueue(rd_host) {
            Some(rd_host) => {
                log::trace!("{:?} dispatched via the exitless queue", code);
                let rd: &RequestDescriptor = unsafe { &*rd_host.as_ptr() };
                rd.lock.wait_for_release(self)?;
                Ok(rd.result())
            }
            None => {
                log::warn!("exitless queue full, falling back to direct exit for {:?}", code);
                self.host.ocall(code, args)
            }
        }
    }
}

/// XBL's blocking phase recurses into the Gateway's own `futex` marshaling
/// rather than an ungoverned host hook (§4.3 supplemental), always via a
/// *direct* exit: waiting for a wait to be serviced by the same queue it
/// would block on is not a thing this gateway does.
impl<'a, H: DirectExit> FutexWait for Gateway<'a, H> {
    fn futex_wait(&self, word: &AtomicU32, expected: u32) -> GwResult<()> {
        let futex_ptr = bmc::classify_host(word.as_ptr())?;
        let args_ptr = self.usa.alloc_typed::<FutexArgs>()?;
        unsafe {
            args_ptr.write(FutexArgs {
                futex: futex_ptr,
                expected,
                timeout_ns: -1,
                ret_status: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let ret = self.host.ocall(OCallCode::Futex, args_host.cast())?;
        if ret >= 0 {
            Ok(())
        } else {
            let errno = -ret;
            if errno == EAGAIN {
                Err(GwError::os(EAGAIN))
            } else {
                log::error!("futex wait returned fatal errno {}", errno);
                Err(GwError::fatal("futex wait returned a non-EAGAIN error"))
            }
        }
    }
}
