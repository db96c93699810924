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

//! Filesystem OCALLs (grounded on `sgx_oc::linux::ocall::file`): `open`,
//! `close`, `read`, `write`, `fstat`, `lseek`, `mkdir`, `getdents`,
//! `rename`, `delete`.

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::{
    CloseArgs, DeleteArgs, Fd, FstatArgs, GetdentsArgs, LseekArgs, MkdirArgs, OpenArgs,
    ReadArgs, RenameArgs, Stat, WriteArgs,
};
use ocg_types::{ensure, GwError, GwResult, OCallCode};

use crate::buffer::BulkBuffer;
use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn open(&self, path: &[u8], flags: i32, mode: u32) -> GwResult<Fd> {
        let _frame = UsaFrame::open(self.usa);
        let (host_path, path_len) = self.copy_in_cstr(path)?;
        let args_ptr = self.usa.alloc_typed::<OpenArgs>()?;
        unsafe {
            args_ptr.write(OpenArgs {
                path: host_path,
                path_len,
                flags,
                mode,
                ret_fd: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Open, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        Ok(unsafe { (*args_ptr).ret_fd })
    }

    pub fn close(&self, fd: Fd) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<CloseArgs>()?;
        unsafe {
            args_ptr.write(CloseArgs { fd });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Close, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    /// §8 scenario 2: buffers beyond `MAX_UNTRUSTED_STACK_BUF` are served
    /// from a host-heap mapping instead of the USA; the number of bytes
    /// copied back is `min(server_reported_len, count)` (P2).
    pub fn read(&self, fd: Fd, buf: *mut u8, count: usize) -> GwResult<usize> {
        let _frame = UsaFrame::open(self.usa);
        ensure!(
            bmc::entirely_inside(buf as *const u8, count),
            GwError::permission("read: destination buffer is not entirely enclave-resident")
        );
        let bulk = BulkBuffer::acquire(self, count)?;
        let args_ptr = self.usa.alloc_typed::<ReadArgs>()?;
        unsafe {
            args_ptr.write(ReadArgs {
                fd,
                buf: bulk.host_ptr(),
                count,
                ret_n: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Read, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let reported = unsafe { (*args_ptr).ret_n };
        ensure!(
            reported >= 0,
            GwError::permission("read: host reported a negative byte count")
        );
        let n = core::cmp::min(reported as usize, count);
        if n > 0 {
            unsafe {
                bmc::copy_to_enclave(buf, count, bulk.host_ptr().as_ptr(), n)?;
            }
        }
        Ok(n)
    }

    /// §8 scenario 3: a straddling buffer is rejected with `-EPERM` before
    /// any host call is made (P1).
    pub fn write(&self, fd: Fd, buf: *const u8, count: usize) -> GwResult<usize> {
        let _frame = UsaFrame::open(self.usa);
        let (host_buf, _bulk) = self.marshal_output_buffer(buf, count)?;
        let args_ptr = self.usa.alloc_typed::<WriteArgs>()?;
        unsafe {
            args_ptr.write(WriteArgs {
                fd,
                buf: host_buf,
                count,
                ret_n: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Write, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let reported = unsafe { (*args_ptr).ret_n };
        ensure!(
            reported >= 0,
            GwError::permission("write: host reported a negative byte count")
        );
        Ok(core::cmp::min(reported as usize, count))
    }

    pub fn fstat(&self, fd: Fd) -> GwResult<Stat> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<FstatArgs>()?;
        unsafe {
            args_ptr.write(FstatArgs {
                fd,
                stat: Stat::default(),
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Fstat, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(unsafe { (*args_ptr).stat })
    }

    pub fn lseek(&self, fd: Fd, offset: i64, whence: i32) -> GwResult<i64> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<LseekArgs>()?;
        unsafe {
            args_ptr.write(LseekArgs {
                fd,
                offset,
                whence,
                ret_offset: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Lseek, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(unsafe { (*args_ptr).ret_offset })
    }

    pub fn mkdir(&self, path: &[u8], mode: u32) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let (host_path, path_len) = self.copy_in_cstr(path)?;
        let args_ptr = self.usa.alloc_typed::<MkdirArgs>()?;
        unsafe {
            args_ptr.write(MkdirArgs {
                path: host_path,
                path_len,
                mode,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Mkdir, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    /// Follows the same large-buffer split as [`Gateway::read`] (§4.5
    /// supplemental).
    pub fn getdents(&self, fd: Fd, buf: *mut u8, buf_cap: usize) -> GwResult<usize> {
        let _frame = UsaFrame::open(self.usa);
        ensure!(
            bmc::entirely_inside(buf as *const u8, buf_cap),
            GwError::permission("getdents: destination buffer is not entirely enclave-resident")
        );
        let bulk = BulkBuffer::acquire(self, buf_cap)?;
        let args_ptr = self.usa.alloc_typed::<GetdentsArgs>()?;
        unsafe {
            args_ptr.write(GetdentsArgs {
                fd,
                buf: bulk.host_ptr(),
                buf_cap,
                ret_n: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Getdents, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let reported = unsafe { (*args_ptr).ret_n };
        ensure!(
            reported >= 0,
            GwError::permission("getdents: host reported a negative byte count")
        );
        let n = core::cmp::min(reported as usize, buf_cap);
        if n > 0 {
            unsafe {
                bmc::copy_to_enclave(buf, buf_cap, bulk.host_ptr().as_ptr(), n)?;
            }
        }
        Ok(n)
    }

    pub fn rename(&self, old_path: &[u8], new_path: &[u8]) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let (old_host, old_len) = self.copy_in_cstr(old_path)?;
        let (new_host, new_len) = self.copy_in_cstr(new_path)?;
        let args_ptr = self.usa.alloc_typed::<RenameArgs>()?;
        unsafe {
            args_ptr.write(RenameArgs {
                old_path: old_host,
                old_len,
                new_path: new_host,
                new_len,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Rename, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    pub fn delete(&self, path: &[u8]) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let (host_path, path_len) = self.copy_in_cstr(path)?;
        let args_ptr = self.usa.alloc_typed::<DeleteArgs>()?;
        unsafe {
            args_ptr.write(DeleteArgs {
                path: host_path,
                path_len,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Delete, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }
}
