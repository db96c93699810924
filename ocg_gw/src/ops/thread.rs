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

//! Thread/process control OCALLs (grounded on `sgx_oc::linux::ocall::thread`):
//! `clone_thread`, `resume_thread`, `create_process` — fixed-size control
//! structs, bit-copied, no variable buffers — plus `exit` (§4.5.7, §8 P7),
//! which never returns to its caller.

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::{CloneThreadArgs, CreateProcessArgs, ExitArgs, ResumeThreadArgs};
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn clone_thread(&self) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<CloneThreadArgs>()?;
        unsafe {
            args_ptr.write(CloneThreadArgs { ret_ok: 0 });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::CloneThread, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    pub fn resume_thread(&self, tcs: usize) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<ResumeThreadArgs>()?;
        unsafe {
            args_ptr.write(ResumeThreadArgs { tcs, ret_ok: 0 });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::ResumeThread, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    pub fn create_process(&self, path: &[u8]) -> GwResult<i32> {
        let _frame = UsaFrame::open(self.usa);
        let (host_path, path_len) = self.copy_in_cstr(path)?;
        let args_ptr = self.usa.alloc_typed::<CreateProcessArgs>()?;
        unsafe {
            args_ptr.write(CreateProcessArgs {
                path: host_path,
                path_len,
                ret_pid: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::CreateProcess, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        Ok(unsafe { (*args_ptr).ret_pid })
    }

    /// Never returns (§4.5.7, P7): if the host returns from the exit
    /// OCALL instead of tearing down the enclave, the Gateway re-issues it
    /// indefinitely rather than letting a malicious or buggy host keep the
    /// enclave alive against the caller's wishes. `code` is the process
    /// exit status; `is_exitgroup` distinguishes `exit` from `exit_group`.
    ///
    /// No exception/panic mechanism crosses the boundary (§7), so a failed
    /// args build or classification here is treated the same as a host
    /// that returned from the exit OCALL: logged, and retried from a fresh
    /// USA frame rather than propagated, since this function has nowhere
    /// to propagate a `GwResult` to.
    pub fn exit(&self, code: i32, is_exitgroup: bool) -> ! {
        let is_exitgroup = is_exitgroup as ocg_types::wire::CInt;
        loop {
            let _frame = UsaFrame::open(self.usa);
            let args_ptr = match self.usa.alloc_typed::<ExitArgs>() {
                Ok(p) => p,
                Err(e) => {
                    log::error!("exit: failed to build args struct, retrying: {}", e);
                    continue;
                }
            };
            unsafe {
                args_ptr.write(ExitArgs { code, is_exitgroup });
            }
            let args_host = match bmc::classify_host(args_ptr) {
                Ok(h) => h,
                Err(e) => {
                    log::error!("exit: args struct not host-resident, retrying: {}", e);
                    continue;
                }
            };
            let _ = self.exitless_ocall(OCallCode::Exit, args_host.cast());
            log::error!("ocall exit returned; host refused to terminate the enclave, retrying");
        }
    }
}
