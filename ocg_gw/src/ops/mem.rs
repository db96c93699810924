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

//! The bulk-buffer primitives themselves (§4.5.4), exposed as ordinary
//! OCALLs so enclave code outside the Gateway's own large-I/O marshaling
//! can map and unmap host memory directly. [`crate::buffer::BulkBuffer`]
//! calls the unexported `raw_*` halves of these directly, since it always
//! runs nested inside another operation's already-open `UsaFrame`.

use ocg_trts::usa::UsaFrame;
use ocg_types::{GwResult, HostPtr};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn mmap_untrusted(&self, len: usize) -> GwResult<HostPtr<u8>> {
        let _frame = UsaFrame::open(self.usa);
        self.raw_mmap_untrusted(len)
    }

    /// The unmapped region must classify `entirely_outside` or the call is
    /// rejected with `EINVAL` (§4.5.7 last bullet).
    pub fn munmap_untrusted(&self, addr: HostPtr<u8>, len: usize) -> GwResult<()> {
        let _frame = UsaFrame::open(self.usa);
        self.raw_munmap_untrusted(addr, len)
    }
}
