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

//! The OCALL Gateway (§4.5): per-operation marshaling across the trust
//! boundary, built on `ocg_trts`' USA/BMC and `ocg_sync`'s XBL/ERQ.
//! Mirrors the role `sgx_oc` plays for the teaclave SDK, narrowed to the
//! OCALL code set in `ocg_types::code::OCallCode`.

#![no_std]

extern crate alloc;

mod buffer;
mod gateway;

pub mod direct_exit;
pub mod ops;

pub use buffer::{BulkBuffer, MAX_UNTRUSTED_STACK_BUF, THREAD_STACK_SIZE};
pub use direct_exit::DirectExit;
pub use gateway::Gateway;
pub use ops::attestation::AttestationBlobs;

#[cfg(test)]
mod tests;
