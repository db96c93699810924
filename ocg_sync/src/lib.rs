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

//! The two synchronization primitives that make the exitless path safe:
//! the Adaptive Cross-Boundary Lock ([`xbl`]) and the Exitless RPC Queue
//! ([`erq`]) built on top of it. Mirrors the role `sgx_sync` plays for the
//! teaclave SDK, narrowed to the one lock shape this gateway needs.

#![no_std]

pub mod erq;
pub mod xbl;

pub use erq::{init_queue, queue, DefaultErq, Erq, RequestDescriptor, ERQ_CAPACITY};
pub use xbl::{FutexWait, FutexWake, Lock, RPC_SPINLOCK_TIMEOUT};
