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

//! Fixed-size OS structs carried across the boundary by bit-copy (§6: "Fixed
//! size OS structs (stat, sockaddr, pollfd) are bit-copied; the
//! implementation must not reinterpret them inside the enclave without a
//! BMC-backed copy"). Every field here is `Copy`/`repr(C)` by construction:
//! there is nowhere a pointer can hide inside one of these.

use crate::ptr::HostPtr;

pub type CInt = i32;
pub type CLong = i64;
pub type Mode = u32;
pub type Off = i64;
pub type Fd = i32;

pub const SOCKADDR_STORAGE_LEN: usize = 128;
pub const PATH_MAX: usize = 4096;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Stat {
    pub st_dev: u64,
    pub st_ino: u64,
    pub st_nlink: u64,
    pub st_mode: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_rdev: u64,
    pub st_size: i64,
    pub st_blksize: i64,
    pub st_blocks: i64,
    pub st_atime: i64,
    pub st_mtime: i64,
    pub st_ctime: i64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PollFd {
    pub fd: Fd,
    pub events: i16,
    pub revents: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Timespec {
    pub tv_sec: i64,
    pub tv_nsec: i64,
}

/// Opaque, fixed-capacity storage large enough for any `sockaddr_*` variant,
/// bit-copied wholesale and interpreted only by the host.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SockAddrStorage {
    pub bytes: [u8; SOCKADDR_STORAGE_LEN],
    pub len: u32,
}

impl Default for SockAddrStorage {
    fn default() -> Self {
        SockAddrStorage {
            bytes: [0u8; SOCKADDR_STORAGE_LEN],
            len: 0,
        }
    }
}

impl core::fmt::Debug for SockAddrStorage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SockAddrStorage")
            .field("len", &self.len)
            .finish()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Dirent64Header {
    pub d_ino: u64,
    pub d_off: i64,
    pub d_reclen: u16,
    pub d_type: u8,
}

// ---------------------------------------------------------------------
// Per-OCALL argument structs (§4.5 supplemental). Each is allocated on the
// USA by the Gateway, filled with BMC-validated host pointers/lengths, and
// handed to `DirectExit::ocall` as a bit pattern the host-side dispatcher
// interprets by OCALL code. Every pointer field is a `HostPtr<T>` for the
// same reason the Gateway itself only ever deals in typed opposite-side
// pointers: nothing downstream of BMC has to re-derive which side of the
// boundary it names.
// ---------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenArgs {
    pub path: HostPtr<u8>,
    pub path_len: usize,
    pub flags: CInt,
    pub mode: Mode,
    pub ret_fd: Fd,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct CloseArgs {
    pub fd: Fd,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadArgs {
    pub fd: Fd,
    pub buf: HostPtr<u8>,
    pub count: usize,
    pub ret_n: isize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteArgs {
    pub fd: Fd,
    pub buf: HostPtr<u8>,
    pub count: usize,
    pub ret_n: isize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FstatArgs {
    pub fd: Fd,
    pub stat: Stat,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct LseekArgs {
    pub fd: Fd,
    pub offset: Off,
    pub whence: CInt,
    pub ret_offset: Off,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct MkdirArgs {
    pub path: HostPtr<u8>,
    pub path_len: usize,
    pub mode: Mode,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct GetdentsArgs {
    pub fd: Fd,
    pub buf: HostPtr<u8>,
    pub buf_cap: usize,
    pub ret_n: isize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct MmapUntrustedArgs {
    pub len: usize,
    pub ret_addr: HostPtr<u8>,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct MunmapUntrustedArgs {
    pub addr: HostPtr<u8>,
    pub len: usize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuidArgs {
    pub leaf: u32,
    pub subleaf: u32,
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ExitArgs {
    pub code: CInt,
    pub is_exitgroup: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct CloneThreadArgs {
    pub ret_ok: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ResumeThreadArgs {
    pub tcs: usize,
    pub ret_ok: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateProcessArgs {
    pub path: HostPtr<u8>,
    pub path_len: usize,
    pub ret_pid: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FutexArgs {
    pub futex: HostPtr<u32>,
    pub expected: u32,
    pub timeout_ns: i64,
    pub ret_status: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SocketpairArgs {
    pub domain: CInt,
    pub ty: CInt,
    pub protocol: CInt,
    pub ret_fd0: Fd,
    pub ret_fd1: Fd,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ListenArgs {
    pub fd: Fd,
    pub backlog: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptArgs {
    pub fd: Fd,
    pub addr: SockAddrStorage,
    pub addr_cap: u32,
    pub ret_fd: Fd,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectArgs {
    pub fd: Fd,
    pub addr: SockAddrStorage,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RecvArgs {
    pub fd: Fd,
    pub buf: HostPtr<u8>,
    pub buf_cap: usize,
    pub control: HostPtr<u8>,
    pub control_cap: usize,
    pub flags: CInt,
    pub ret_n: isize,
    pub ret_control_len: usize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SendArgs {
    pub fd: Fd,
    pub buf: HostPtr<u8>,
    pub buf_len: usize,
    pub flags: CInt,
    pub ret_n: isize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SetsockoptArgs {
    pub fd: Fd,
    pub level: CInt,
    pub optname: CInt,
    pub optval: HostPtr<u8>,
    pub optlen: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ShutdownArgs {
    pub fd: Fd,
    pub how: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct GettimeArgs {
    pub clock_id: CInt,
    pub ts: Timespec,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepArgs {
    pub micros: u64,
    pub remaining_micros: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PollArgs {
    pub fds: HostPtr<PollFd>,
    pub nfds: usize,
    pub timeout_ms: CInt,
    pub ret_n: CInt,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct RenameArgs {
    pub old_path: HostPtr<u8>,
    pub old_len: usize,
    pub new_path: HostPtr<u8>,
    pub new_len: usize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct DeleteArgs {
    pub path: HostPtr<u8>,
    pub path_len: usize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadDebugArgs {
    pub payload_addr: u64,
    pub payload_len: usize,
}

/// The four blobs `get_attestation` copies in, per §4.5.7 "all-or-nothing
/// on failure": quote, collateral, report, and the target-info the quote
/// was generated against.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct AttestationArgs {
    pub quote: HostPtr<u8>,
    pub quote_len: usize,
    pub collateral: HostPtr<u8>,
    pub collateral_len: usize,
    pub report: HostPtr<u8>,
    pub report_len: usize,
    pub target_info: HostPtr<u8>,
    pub target_info_len: usize,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct EventfdArgs {
    pub initval: u32,
    pub flags: CInt,
    pub ret_fd: Fd,
}
