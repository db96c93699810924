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

//! Typed opposite-side pointers (design note §9).
//!
//! A raw `*mut T` carries no information about which side of the trust
//! boundary it names. `HostPtr<T>` and `EnclavePtr<T>` do: the only safe way
//! to produce one is `ocg_trts::bmc`, which has already run the
//! `entirely_inside`/`entirely_outside` classification. Code holding one of
//! these types never needs to re-derive which region it points into.

use core::marker::PhantomData;

/// A pointer known to reference host (untrusted) memory.
#[derive(Debug)]
pub struct HostPtr<T> {
    ptr: *mut T,
    _marker: PhantomData<*mut T>,
}

impl<T> HostPtr<T> {
    /// # Safety
    /// The caller must already have verified, via BMC's
    /// `entirely_outside` predicate, that the `size_of::<T>()` bytes
    /// starting at `ptr` lie entirely in host memory.
    pub unsafe fn new_unchecked(ptr: *mut T) -> Self {
        HostPtr {
            ptr,
            _marker: PhantomData,
        }
    }

    pub fn null() -> Self {
        HostPtr {
            ptr: core::ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn cast<U>(&self) -> HostPtr<U> {
        HostPtr {
            ptr: self.ptr as *mut U,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for HostPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for HostPtr<T> {}

impl<T> Default for HostPtr<T> {
    fn default() -> Self {
        HostPtr::null()
    }
}

unsafe impl<T> Send for HostPtr<T> {}

/// A pointer known to reference enclave (trusted) memory.
#[derive(Debug)]
pub struct EnclavePtr<T> {
    ptr: *mut T,
    _marker: PhantomData<*mut T>,
}

impl<T> EnclavePtr<T> {
    /// # Safety
    /// The caller must already have verified, via BMC's
    /// `entirely_inside` predicate, that the `size_of::<T>()` bytes
    /// starting at `ptr` lie entirely in enclave memory.
    pub unsafe fn new_unchecked(ptr: *mut T) -> Self {
        EnclavePtr {
            ptr,
            _marker: PhantomData,
        }
    }

    pub fn null() -> Self {
        EnclavePtr {
            ptr: core::ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

impl<T> Clone for EnclavePtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for EnclavePtr<T> {}

impl<T> Default for EnclavePtr<T> {
    fn default() -> Self {
        EnclavePtr::null()
    }
}

unsafe impl<T> Send for EnclavePtr<T> {}
