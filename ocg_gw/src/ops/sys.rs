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

//! Clock OCALLs (grounded on `sgx_oc::linux::ocall::time`): `gettime`
//! retries internally across `EINTR`, `sleep` always direct-exits and
//! writes the remaining time back on interruption (§4.5.7, §8 suspension
//! point (d)).

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::error::EINTR;
use ocg_types::wire::{GettimeArgs, SleepArgs, Timespec};
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn gettime(&self, clock_id: i32) -> GwResult<Timespec> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<GettimeArgs>()?;
        let args_host = bmc::classify_host(args_ptr)?;
        loop {
            unsafe {
                args_ptr.write(GettimeArgs {
                    clock_id,
                    ts: Timespec::default(),
                });
            }
            let status = self.exitless_ocall(OCallCode::Gettime, args_host.cast())?;
            if status >= 0 {
                return Ok(unsafe { (*args_ptr).ts });
            }
            let errno = -status;
            if errno == EINTR {
                log::trace!("gettime interrupted, retrying");
                continue;
            }
            return Err(GwError::os(errno));
        }
    }

    /// Never dispatched through the exitless queue (§4.5.7: "always uses
    /// direct-exit"). Returns the microseconds remaining if a signal cut
    /// the sleep short, or `0` if it ran to completion.
    pub fn sleep(&self, micros: u64) -> GwResult<u64> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<SleepArgs>()?;
        unsafe {
            args_ptr.write(SleepArgs {
                micros,
                remaining_micros: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.host.ocall(OCallCode::Sleep, args_host.cast())?;
        if status >= 0 {
            return Ok(0);
        }
        let errno = -status;
        ensure!(errno == EINTR, GwError::os(errno));
        Ok(unsafe { (*args_ptr).remaining_micros })
    }
}
