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

//! `eventfd`: fixed `initval`/`flags` in, fd out, no buffers (§4.5
//! supplemental).

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::{EventfdArgs, Fd};
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn eventfd(&self, initval: u32, flags: i32) -> GwResult<Fd> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<EventfdArgs>()?;
        unsafe {
            args_ptr.write(EventfdArgs {
                initval,
                flags,
                ret_fd: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Eventfd, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        Ok(unsafe { (*args_ptr).ret_fd })
    }
}
