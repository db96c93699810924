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

//! `poll` (grounded on `sgx_oc::linux::ocall::asyncio`): the caller's
//! `pollfd` array is bit-copied onto the USA, BMC-checked both as the
//! enclave source and as the host-resident scratch copy the dispatcher
//! actually sees, and copied back once the host has filled in `revents`
//! (§4.5 supplemental).

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::{PollArgs, PollFd};
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::buffer::BulkBuffer;
use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn poll(&self, fds: &mut [PollFd], timeout_ms: i32) -> GwResult<i32> {
        let _frame = UsaFrame::open(self.usa);
        let nfds = fds.len();
        let byte_len = nfds * core::mem::size_of::<PollFd>();
        if byte_len > 0 {
            ensure!(
                bmc::entirely_inside(fds.as_ptr() as *const u8, byte_len),
                GwError::permission("poll: fd array is not entirely enclave-resident")
            );
        }
        let bulk = BulkBuffer::acquire(self, byte_len)?;
        if byte_len > 0 {
            unsafe {
                bmc::copy_to_host(bulk.host_ptr().as_ptr(), fds.as_ptr() as *const u8, byte_len)?;
            }
        }
        let args_ptr = self.usa.alloc_typed::<PollArgs>()?;
        unsafe {
            args_ptr.write(PollArgs {
                fds: bulk.host_ptr().cast(),
                nfds,
                timeout_ms,
                ret_n: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Poll, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        if byte_len > 0 {
            unsafe {
                bmc::copy_to_enclave(
                    fds.as_mut_ptr() as *mut u8,
                    byte_len,
                    bulk.host_ptr().as_ptr(),
                    byte_len,
                )?;
            }
        }
        Ok(unsafe { (*args_ptr).ret_n })
    }
}
