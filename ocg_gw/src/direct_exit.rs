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

//! The one primitive the Gateway does not implement itself: the actual
//! enclave-exit transition (§6 `ocall(code, args_host_ptr)`). `sgx_trts`
//! wires this as `extern "C" fn do_ocall` and calls it from
//! `sgx_trts::call::ocall::ocall`; here it's a trait so the Gateway can be
//! driven by a scripted in-process implementation under test (see
//! `ScriptedHost` in `crate::tests`) instead of requiring a linked enclave
//! runtime.

use ocg_types::{GwResult, HostPtr, OCallCode};

/// Performs one direct (enclave-exit) OCALL: hands the host the code and a
/// host-resident pointer to the operation's argument struct, and blocks
/// until the host dispatcher has filled in the struct's output fields.
///
/// Returns the raw host return value (the same convention the per-op args
/// struct's `ret_*` field uses: non-negative on success, `-errno` on
/// failure) so callers that need the raw code — `futex`'s `EAGAIN`, for
/// instance — can see it without the trait itself picking a taxonomy.
pub trait DirectExit {
    fn ocall(&self, code: OCallCode, args: HostPtr<u8>) -> GwResult<i32>;
}
