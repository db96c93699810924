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

//! The OCALL code table (§3): one variant per operation the gateway can
//! marshal. Each code fixes the shape of its argument struct on the other
//! side of the boundary; adding a code is only ever done in tandem with the
//! untrusted dispatcher that understands it.

use core::convert::TryFrom;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u32)]
pub enum OCallCode {
    Open = 0,
    Close = 1,
    Read = 2,
    Write = 3,
    Fstat = 4,
    Lseek = 5,
    Mkdir = 6,
    Getdents = 7,
    MmapUntrusted = 8,
    MunmapUntrusted = 9,
    Cpuid = 10,
    Exit = 11,
    CloneThread = 12,
    ResumeThread = 13,
    CreateProcess = 14,
    Futex = 15,
    Socketpair = 16,
    Listen = 17,
    Accept = 18,
    Connect = 19,
    Recv = 20,
    Send = 21,
    Setsockopt = 22,
    Shutdown = 23,
    Gettime = 24,
    Sleep = 25,
    Poll = 26,
    Rename = 27,
    Delete = 28,
    LoadDebug = 29,
    GetAttestation = 30,
    Eventfd = 31,
}

impl OCallCode {
    pub const COUNT: u32 = 32;

    /// `sleep` is fixed to the direct-exit path (§4.5.7); it may never be
    /// dispatched through the exitless queue.
    pub const fn is_exitless_eligible(&self) -> bool {
        !matches!(self, OCallCode::Sleep | OCallCode::Exit)
    }
}

impl TryFrom<u32> for OCallCode {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, ()> {
        use OCallCode::*;
        Ok(match value {
            0 => Open,
            1 => Close,
            2 => Read,
            3 => Write,
            4 => Fstat,
            5 => Lseek,
            6 => Mkdir,
            7 => Getdents,
            8 => MmapUntrusted,
            9 => MunmapUntrusted,
            10 => Cpuid,
            11 => Exit,
            12 => CloneThread,
            13 => ResumeThread,
            14 => CreateProcess,
            15 => Futex,
            16 => Socketpair,
            17 => Listen,
            18 => Accept,
            19 => Connect,
            20 => Recv,
            21 => Send,
            22 => Setsockopt,
            23 => Shutdown,
            24 => Gettime,
            25 => Sleep,
            26 => Poll,
            27 => Rename,
            28 => Delete,
            29 => LoadDebug,
            30 => GetAttestation,
            31 => Eventfd,
            _ => return Err(()),
        })
    }
}

impl From<OCallCode> for u32 {
    fn from(code: OCallCode) -> u32 {
        code as u32
    }
}
