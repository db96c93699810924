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

//! Wire types, error taxonomy and the OCALL code table shared by every
//! other gateway crate. No logic lives here beyond `TryFrom`/`Display`
//! glue — this crate is the vocabulary the rest of the gateway is written
//! in, the same role `sgx_types` plays for the teaclave SDK.

#![no_std]

pub mod macros;

pub mod code;
pub mod error;
pub mod ptr;
pub mod wire;

pub use code::OCallCode;
pub use error::{GwError, GwResult, OsError};
pub use ptr::{EnclavePtr, HostPtr};
