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

//! Error taxonomy for the OCALL gateway (§7 of the design).
//!
//! Everything that crosses back out of the gateway is one of: a permission
//! failure (the boundary rejected something), an invalid-argument failure
//! (a caller-supplied value can never be honored), a pass-through OS errno
//! (including the retryable `EINTR`/`EAGAIN` the caller is expected to
//! handle), or a fatal condition. None of these ever unwind; nothing here
//! implements `panic!`.

use core::fmt;

/// Host-side errno pass-through, as returned by the Linux syscalls the
/// OCALL dispatcher ultimately issues.
pub type OsError = i32;
pub type GwResult<T = ()> = Result<T, GwError>;

pub const EPERM: OsError = 1;
pub const EINTR: OsError = 4;
pub const EAGAIN: OsError = 11;
pub const EACCES: OsError = 13;
pub const EINVAL: OsError = 22;
pub const ETIMEDOUT: OsError = 110;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GwError {
    /// Isolation/permission failure: USA exhaustion, a straddling pointer,
    /// a BMC copy rejection, descriptor-pointer forgery, or an
    /// unexpected host-returned size. Surfaced to callers as `-EPERM`.
    Permission(&'static str),
    /// A caller-supplied argument can never be honored regardless of host
    /// state: `munmap_untrusted` of a region that isn't entirely outside,
    /// `futex` given an in-enclave futex word, an ambiguous `recv`
    /// control-buffer request. Surfaced as `-EINVAL`.
    InvalidArgument(&'static str),
    /// Raw host errno, passed through unchanged. Includes `EINTR`/`EAGAIN`
    /// where the caller is expected to retry.
    Os(OsError),
    /// The futex wait returned something other than `EAGAIN` — not
    /// recoverable by XBL's retry loop.
    Fatal(&'static str),
}

impl GwError {
    pub const fn permission(reason: &'static str) -> GwError {
        GwError::Permission(reason)
    }

    pub const fn invalid(reason: &'static str) -> GwError {
        GwError::InvalidArgument(reason)
    }

    pub const fn os(errno: OsError) -> GwError {
        GwError::Os(errno)
    }

    pub const fn fatal(reason: &'static str) -> GwError {
        GwError::Fatal(reason)
    }

    /// The signed, negative-on-error wire code this error surfaces as at
    /// the OCALL return boundary (§7: "all errors surface as the return
    /// code of the OCALL").
    pub fn as_retcode(&self) -> i32 {
        match self {
            GwError::Permission(_) => -EPERM,
            GwError::InvalidArgument(_) => -EINVAL,
            GwError::Os(errno) => -*errno,
            GwError::Fatal(_) => -EPERM,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GwError::Os(EINTR) | GwError::Os(EAGAIN))
    }
}

impl fmt::Display for GwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GwError::Permission(reason) => write!(f, "permission denied: {}", reason),
            GwError::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
            GwError::Os(errno) => write!(f, "os error {}", errno),
            GwError::Fatal(reason) => write!(f, "fatal: {}", reason),
        }
    }
}

impl core::error::Error for GwError {}
