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

//! The trusted-side runtime primitives of the OCALL gateway: the Boundary
//! Memory Checker ([`bmc`]) and the Untrusted-Stack Allocator ([`usa`]),
//! plus the initialize-once cell ([`once`]) used to wire up both of them
//! and the exitless RPC queue without a mutable global in sight. Mirrors
//! the role `sgx_trts` plays for the teaclave SDK, narrowed to the
//! boundary-crossing primitives this gateway needs.

#![no_std]

pub mod bmc;
pub mod once;
pub mod usa;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bmc::Regions;
pub use once::OnceCell;
pub use usa::{Usa, UsaFrame, UsaRegion};
