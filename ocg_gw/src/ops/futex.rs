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

//! The general-purpose `futex` OCALL (§4.5.7, §8 scenario 4): available
//! to any enclave code that needs a cross-boundary futex word, not just
//! XBL's own internal wait (that one always bypasses the exitless queue;
//! see [`crate::gateway::Gateway`]'s `FutexWait` impl). The futex pointer
//! supplied here must be entirely outside the enclave or the call is
//! rejected with `EINVAL` before any dispatch is attempted.

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::FutexArgs;
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn futex(&self, futex_word: *mut u32, expected: u32, timeout_ns: i64) -> GwResult<i32> {
        let _frame = UsaFrame::open(self.usa);
        ensure!(
            bmc::entirely_outside(futex_word as *const u8, core::mem::size_of::<u32>()),
            GwError::invalid("futex: word is not entirely outside the enclave")
        );
        let host_futex = bmc::classify_host(futex_word)?;
        let args_ptr = self.usa.alloc_typed::<FutexArgs>()?;
        unsafe {
            args_ptr.write(FutexArgs {
                futex: host_futex,
                expected,
                timeout_ns,
                ret_status: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        self.exitless_ocall(OCallCode::Futex, args_host.cast())
    }
}
