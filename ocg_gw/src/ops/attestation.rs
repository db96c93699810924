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

//! `get_attestation` (§4.5.7, §8 P8): the host hands back pointers to four
//! host-allocated blobs. The Gateway copies each into a freshly
//! enclave-allocated buffer and unmaps the host region, all-or-nothing on
//! failure — if any copy fails, the buffers already copied in are plain
//! owned `Vec`s local to this call, so an early `?` return frees them the
//! ordinary way without any explicit cleanup list.

use alloc::vec;
use alloc::vec::Vec;

use ocg_trts::bmc;
use ocg_trts::usa::UsaFrame;
use ocg_types::wire::AttestationArgs;
use ocg_types::{ensure, GwError, GwResult, HostPtr, OCallCode};

use crate::direct_exit::DirectExit;
use crate::gateway::Gateway;

/// The four blobs an attestation round-trip produces, now enclave-resident.
#[derive(Debug, Default)]
pub struct AttestationBlobs {
    pub quote: Vec<u8>,
    pub collateral: Vec<u8>,
    pub report: Vec<u8>,
    pub target_info: Vec<u8>,
}

impl<'a, H: DirectExit> Gateway<'a, H> {
    pub fn get_attestation(&self) -> GwResult<AttestationBlobs> {
        let _frame = UsaFrame::open(self.usa);
        let args_ptr = self.usa.alloc_typed::<AttestationArgs>()?;
        unsafe {
            args_ptr.write(AttestationArgs::default());
        }
        let args_host = bmc::classify_host(args_ptr)?;
        let status = self.exitless_ocall(OCallCode::GetAttestation, args_host.cast())?;
        ensure!(status == 0, GwError::os(-status));
        let a = unsafe { *args_ptr };

        let quote = self.copy_blob_and_unmap(a.quote, a.quote_len)?;
        let collateral = self.copy_blob_and_unmap(a.collateral, a.collateral_len)?;
        let report = self.copy_blob_and_unmap(a.report, a.report_len)?;
        let target_info = self.copy_blob_and_unmap(a.target_info, a.target_info_len)?;

        Ok(AttestationBlobs {
            quote,
            collateral,
            report,
            target_info,
        })
    }

    fn copy_blob_and_unmap(&self, host_ptr: HostPtr<u8>, len: usize) -> GwResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        ensure!(
            bmc::entirely_outside(host_ptr.as_ptr(), len),
            GwError::permission("attestation blob is not entirely host-resident")
        );
        let mut buf = vec![0u8; len];
        unsafe {
            bmc::copy_to_enclave(buf.as_mut_ptr(), len, host_ptr.as_ptr(), len)?;
        }
        if let Err(e) = self.raw_munmap_untrusted(host_ptr, len) {
            log::error!("failed to unmap attestation blob: {}", e);
        }
        Ok(buf)
    }
}
