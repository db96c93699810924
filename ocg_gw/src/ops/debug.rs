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

//! `load_debug` (§1 Non-goals: debugger hooks are an external
//! collaborator). Wired for completeness: a fixed-size payload descriptor
//! with no enclave-resident pointers, passed straight through with no
//! buffer marshaling of its own.

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::LoadDebugArgs;
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn load_debug(&self, payload_addr: u64, payload_len: usize) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<LoadDebugArgs>()?;
        unsafe {
            args_ptr.write(LoadDebugArgs {
                payload_addr,
                payload_len,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::LoadDebug, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }
}
