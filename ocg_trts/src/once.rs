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

//! An initialize-once cell, for globals like `g_rpc_queue` that are set
//! exactly once before any concurrent use and never mutated afterwards
//! (design note §9: "encode as an initialize-once cell rather than a
//! mutable global").

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};
use spin::Mutex;

const INCOMPLETE: usize = 0;
const RUNNING: usize = 1;
const COMPLETE: usize = 2;

pub struct OnceCell<T> {
    state: AtomicUsize,
    lock: Mutex<()>,
    value: UnsafeCell<Option<T>>,
}

unsafe impl<T: Send> Send for OnceCell<T> {}
unsafe impl<T: Send + Sync> Sync for OnceCell<T> {}

impl<T> OnceCell<T> {
    pub const fn new() -> Self {
        OnceCell {
            state: AtomicUsize::new(INCOMPLETE),
            lock: Mutex::new(()),
            value: UnsafeCell::new(None),
        }
    }

    /// Sets the value if unset. Returns `false` if it was already
    /// initialized. Only ever called once in practice (at gateway
    /// initialization), but is safe to call redundantly.
    pub fn set(&self, value: T) -> bool {
        if self.state.load(Ordering::Acquire) == COMPLETE {
            return false;
        }
        let _guard = self.lock.lock();
        if self.state.load(Ordering::Acquire) == COMPLETE {
            return false;
        }
        self.state.store(RUNNING, Ordering::Relaxed);
        unsafe {
            *self.value.get() = Some(value);
        }
        self.state.store(COMPLETE, Ordering::Release);
        true
    }

    pub fn get(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) != COMPLETE {
            return None;
        }
        unsafe { (*self.value.get()).as_ref() }
    }

    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETE
    }
}

impl<T> Default for OnceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
