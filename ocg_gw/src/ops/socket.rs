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

//! Socket OCALLs (grounded on `sgx_oc::linux::ocall::socket`/`socket_msg`):
//! `socketpair`, `listen`, `accept`, `connect`, `recv`, `send`,
//! `setsockopt`, `shutdown`. Fixed-size socket addresses travel bit-copied
//! inline in the args struct; `recv`'s control buffer resolves the
//! null-pointer/zero-length ambiguity by rejecting an ambiguous pairing
//! outright, before any host dispatch.

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::{
    AcceptArgs, ConnectArgs, Fd, ListenArgs, RecvArgs, SendArgs, SetsockoptArgs, ShutdownArgs,
    SockAddrStorage, SocketpairArgs,
};
use ocg_types::{ensure, GwError, GwResult, HostPtr, OCallCode};

use crate::buffer::BulkBuffer;
use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn socketpair(&self, domain: i32, ty: i32, protocol: i32) -> GwResult<(Fd, Fd)> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<SocketpairArgs>()?;
        unsafe {
            args_ptr.write(SocketpairArgs {
                domain,
                ty,
                protocol,
                ret_fd0: 0,
                ret_fd1: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Socketpair, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        let a = unsafe { *args_ptr };
        Ok((a.ret_fd0, a.ret_fd1))
    }

    pub fn listen(&self, fd: Fd, backlog: i32) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<ListenArgs>()?;
        unsafe {
            args_ptr.write(ListenArgs { fd, backlog });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Listen, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    /// The returned address length is clamped to `addr_cap` regardless of
    /// what the host reports (§4.5.7).
    pub fn accept(&self, fd: Fd, addr_cap: u32) -> GwResult<(Fd, SockAddrStorage)> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<AcceptArgs>()?;
        unsafe {
            args_ptr.write(AcceptArgs {
                fd,
                addr: SockAddrStorage::default(),
                addr_cap,
                ret_fd: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Accept, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let mut a = unsafe { *args_ptr };
        a.addr.len = core::cmp::min(a.addr.len, addr_cap);
        Ok((a.ret_fd, a.addr))
    }

    pub fn connect(&self, fd: Fd, addr: SockAddrStorage) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<ConnectArgs>()?;
        unsafe {
            args_ptr.write(ConnectArgs { fd, addr });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Connect, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    /// Resolves the open question on `control`/`control_cap`: a non-null
    /// `control` with zero capacity, or a null `control` with nonzero
    /// capacity, is rejected with `EINVAL` before any buffer is touched.
    /// Both returned sizes are clamped to their respective caller
    /// capacities (P2-equivalent for the socket path).
    pub fn recv(
        &self,
        fd: Fd,
        buf: *mut u8,
        buf_cap: usize,
        control: *mut u8,
        control_cap: usize,
        flags: i32,
    ) -> GwResult<(usize, usize)> {
        let _frame = UsaFrame::open(self.usa);
        ensure!(
            control.is_null() == (control_cap == 0),
            GwError::invalid("recv: control pointer and control_cap are ambiguous")
        );
        ensure!(
            bmc::entirely_inside(buf as *const u8, buf_cap),
            GwError::permission("recv: destination buffer is not entirely enclave-resident")
        );
        let bulk = BulkBuffer::acquire(self, buf_cap)?;

        let control_bulk = if control.is_null() {
            None
        } else {
            ensure!(
                bmc::entirely_inside(control as *const u8, control_cap),
                GwError::permission("recv: control buffer is not entirely enclave-resident")
            );
            Some(BulkBuffer::acquire(self, control_cap)?)
        };
        let (host_control, host_control_cap) = match &control_bulk {
            Some(b) => (b.host_ptr(), control_cap),
            None => (HostPtr::null(), 0),
        };

        let args_ptr = self.usa.alloc_typed::<RecvArgs>()?;
        unsafe {
            args_ptr.write(RecvArgs {
                fd,
                buf: bulk.host_ptr(),
                buf_cap,
                control: host_control,
                control_cap: host_control_cap,
                flags,
                ret_n: 0,
                ret_control_len: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Recv, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let a = unsafe { *args_ptr };
        ensure!(
            a.ret_n >= 0,
            GwError::permission("recv: host reported a negative byte count")
        );

        let n = core::cmp::min(a.ret_n as usize, buf_cap);
        if n > 0 {
            unsafe {
                bmc::copy_to_enclave(buf, buf_cap, bulk.host_ptr().as_ptr(), n)?;
            }
        }
        let control_len = core::cmp::min(a.ret_control_len, control_cap);
        if control_len > 0 {
            let b = control_bulk
                .as_ref()
                .expect("host reported a control length with no control buffer requested");
            unsafe {
                bmc::copy_to_enclave(control, control_cap, b.host_ptr().as_ptr(), control_len)?;
            }
        }
        Ok((n, control_len))
    }

    pub fn send(&self, fd: Fd, buf: *const u8, buf_len: usize, flags: i32) -> GwResult<usize> {
        let _frame = UsaFrame::open(self.usa);
        let (host_buf, _bulk) = self.marshal_output_buffer(buf, buf_len)?;
        let args_ptr = self.usa.alloc_typed::<SendArgs>()?;
        unsafe {
            args_ptr.write(SendArgs {
                fd,
                buf: host_buf,
                buf_len,
                flags,
                ret_n: 0,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Send, args_host.cast())?;
        ensure!(status >= 0, GwError::os(-status));
        let reported = unsafe { (*args_ptr).ret_n };
        ensure!(
            reported >= 0,
            GwError::permission("send: host reported a negative byte count")
        );
        Ok(core::cmp::min(reported as usize, buf_len))
    }

    pub fn setsockopt(&self, fd: Fd, level: i32, optname: i32, optval: &[u8]) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let (host_optval, _bulk) =
            self.marshal_output_buffer(optval.as_ptr(), optval.len())?;
        let args_ptr = self.usa.alloc_typed::<SetsockoptArgs>()?;
        unsafe {
            args_ptr.write(SetsockoptArgs {
                fd,
                level,
                optname,
                optval: host_optval,
                optlen: optval.len() as u32,
            });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Setsockopt, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }

    pub fn shutdown(&self, fd: Fd, how: i32) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<ShutdownArgs>()?;
        unsafe {
            args_ptr.write(ShutdownArgs { fd, how });
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::Shutdown, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        Ok(())
    }
}
