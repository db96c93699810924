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

//! One module per OCALL category (§4.5 supplemental), each contributing
//! `impl<H: DirectExit> Gateway<H>` methods. Mirrors `sgx_oc`'s own
//! per-category split (`file.rs`, `socket.rs`, `thread.rs`, ...).

pub mod asyncio;
pub mod attestation;
pub mod cpuid;
pub mod debug;
pub mod eventfd;
pub mod file;
pub mod futex;
pub mod mem;
pub mod socket;
pub mod sys;
pub mod thread;
