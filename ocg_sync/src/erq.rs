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

//! The Exitless RPC Queue (§4.4): a bounded, lock-free MPMC ring of
//! Request Descriptor pointers. Producers are enclave threads; consumers
//! are untrusted RPC workers. A full queue is never an error — it's the
//! signal the Gateway uses to fall back to a direct enclave-exit.
//!
//! The ring itself follows Dmitry Vyukov's bounded MPMC queue: each slot
//! carries its own sequence number, so producers and consumers never
//! contend on a single lock, only on the two monotonically increasing
//! position counters. The SGX SDK this gateway is built in the style of
//! never runs exitless (it only has the direct enclave-exit path), so
//! this module has no sibling to adapt from; the lock word each slot's
//! descriptor carries is the same [`crate::xbl::Lock`] used everywhere
//! else in this crate.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use ocg_types::{HostPtr, OCallCode};

use crate::xbl::Lock;
use ocg_trts::OnceCell;

/// Host-resident record describing one in-flight OCALL (§3 Data Model).
pub struct RequestDescriptor {
    pub ocall_code: OCallCode,
    pub args_ptr: HostPtr<u8>,
    pub lock: Lock,
    pub result: AtomicI32,
}

impl RequestDescriptor {
    /// Builds a descriptor already in the locked state (RD lifecycle step
    /// 1): the enclave thread owns it exclusively until a worker takes it
    /// off the queue.
    pub fn new(ocall_code: OCallCode, args_ptr: HostPtr<u8>) -> Self {
        RequestDescriptor {
            ocall_code,
            args_ptr,
            lock: Lock::new_locked(),
            result: AtomicI32::new(0),
        }
    }

    pub fn result(&self) -> i32 {
        self.result.load(Ordering::Acquire)
    }

    /// Worker-side half of the protocol (test/simulation only in this
    /// crate, see [`crate::xbl::Lock::release`]): stores the result with
    /// release ordering before unlocking, so the enclave thread's acquire
    /// load of `result` after reacquiring the lock always observes it.
    pub fn complete(&self, result: i32) -> bool {
        self.result.store(result, Ordering::Release);
        self.lock.release()
    }
}

struct Slot {
    sequence: AtomicUsize,
    value: UnsafeCell<usize>,
}

impl Slot {
    fn new(i: usize) -> Self {
        Slot {
            sequence: AtomicUsize::new(i),
            value: UnsafeCell::new(0),
        }
    }
}

/// Default ring capacity; one queue serves every enclave thread, so this
/// is sized for a moderately threaded workload rather than any single
/// thread's concurrency.
pub const ERQ_CAPACITY: usize = 256;

/// A bounded lock-free MPMC ring of `*mut RequestDescriptor`, encoded as
/// raw addresses since the pointee lives in host memory the ring itself
/// is also part of (§4.4: "the queue resides in host memory").
pub struct Erq<const N: usize> {
    slots: [Slot; N],
    enqueue_pos: AtomicUsize,
    dequeue_pos: AtomicUsize,
}

// SAFETY: each slot's `value` cell is only touched by whichever thread
// currently owns that slot's sequence number, enforced by the CAS on
// `enqueue_pos`/`dequeue_pos` below.
unsafe impl<const N: usize> Sync for Erq<N> {}
unsafe impl<const N: usize> Send for Erq<N> {}

impl<const N: usize> Erq<N> {
    pub fn new() -> Self {
        Erq {
            slots: core::array::from_fn(Slot::new),
            enqueue_pos: AtomicUsize::new(0),
            dequeue_pos: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Enqueues `rd`. Returns `Some(rd)` back on success (§4.4:
    /// `enqueue(rd) -> rd|null`), `None` iff the queue was full — the
    /// Gateway's cue to fall back to a direct enclave-exit rather than an
    /// error condition.
    pub fn enqueue(&self, rd: HostPtr<RequestDescriptor>) -> Option<HostPtr<RequestDescriptor>> {
        let addr = rd.as_ptr() as usize;
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos % N];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;
            if diff == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { *slot.value.get() = addr };
                        slot.sequence.store(pos + 1, Ordering::Release);
                        return Some(rd);
                    }
                    Err(cur) => pos = cur,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Dequeues the oldest enqueued descriptor, or `None` if the ring is
    /// currently empty.
    ///
    /// # Safety
    /// The caller must only reconstruct the pointer for a descriptor it
    /// previously enqueued with [`Self::enqueue`] — this ring stores raw
    /// addresses and cannot itself re-verify BMC classification.
    pub unsafe fn dequeue(&self) -> Option<HostPtr<RequestDescriptor>> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos % N];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - (pos + 1) as isize;
            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let addr = *slot.value.get();
                        slot.sequence.store(pos + N, Ordering::Release);
                        let ptr = addr as *mut RequestDescriptor;
                        return Some(HostPtr::new_unchecked(ptr));
                    }
                    Err(cur) => pos = cur,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }
    }
}

impl<const N: usize> Default for Erq<N> {
    fn default() -> Self {
        Self::new()
    }
}

pub type DefaultErq = Erq<ERQ_CAPACITY>;

static G_RPC_QUEUE: OnceCell<DefaultErq> = OnceCell::new();

/// Sets `g_rpc_queue` once, at enclave initialization, before any OCALL
/// can occur (§4.4). Idempotent: later calls are no-ops.
pub fn init_queue() -> bool {
    G_RPC_QUEUE.set(DefaultErq::new())
}

/// `None` here is exactly "`g_rpc_queue` is null" in §4.4's terms: the
/// Gateway must unconditionally use the direct-exit path.
pub fn queue() -> Option<&'static DefaultErq> {
    G_RPC_QUEUE.get()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use ocg_trts::test_support::SimulatedBoundary;
    use std::sync::Arc;
    use std::thread;
    use std::vec::Vec;

    fn make_rd(boundary: &SimulatedBoundary, offset: usize) -> HostPtr<RequestDescriptor> {
        let ptr = boundary.host_ptr_mut(offset) as *mut RequestDescriptor;
        unsafe { HostPtr::new_unchecked(ptr) }
    }

    #[test]
    fn enqueue_dequeue_round_trips() {
        let boundary = SimulatedBoundary::install();
        let erq: Erq<4> = Erq::new();
        let rd = make_rd(&boundary, 0);
        assert!(erq.enqueue(rd).is_some());
        let got = unsafe { erq.dequeue() }.unwrap();
        assert_eq!(got.as_ptr(), rd.as_ptr());
    }

    #[test]
    fn full_queue_signals_fallback_not_error() {
        let boundary = SimulatedBoundary::install();
        let erq: Erq<2> = Erq::new();
        assert!(erq.enqueue(make_rd(&boundary, 0)).is_some());
        assert!(erq.enqueue(make_rd(&boundary, 64)).is_some());
        assert!(erq.enqueue(make_rd(&boundary, 128)).is_none());
    }

    #[test]
    fn empty_queue_dequeues_none() {
        let erq: Erq<4> = Erq::new();
        assert!(unsafe { erq.dequeue() }.is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// P6 ERQ fallback: enqueueing any number of descriptors into a
            /// fixed-capacity ring succeeds exactly `capacity` times and
            /// reports full for every attempt after that — never more, and
            /// never fewer while slots remain free.
            #[test]
            fn enqueue_succeeds_exactly_capacity_times(attempts in 0usize..64) {
                let boundary = SimulatedBoundary::install();
                let erq: Erq<8> = Erq::new();
                let mut accepted = 0usize;
                for i in 0..attempts {
                    let rd = make_rd(&boundary, i * 8);
                    if erq.enqueue(rd).is_some() {
                        accepted += 1;
                    }
                }
                prop_assert_eq!(accepted, core::cmp::min(attempts, erq.capacity()));
            }
        }
    }

    #[test]
    fn concurrent_producers_each_see_their_item_exactly_once() {
        let boundary = Arc::new(SimulatedBoundary::install());
        let erq = Arc::new(Erq::<64>::new());
        let mut handles = Vec::new();
        for i in 0..8usize {
            let erq = Arc::clone(&erq);
            let boundary = Arc::clone(&boundary);
            handles.push(thread::spawn(move || {
                let rd = make_rd(&boundary, i * 8);
                erq.enqueue(rd).is_some()
            }));
        }
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|ok| *ok));

        let mut seen = std::collections::HashSet::new();
        while let Some(rd) = unsafe { erq.dequeue() } {
            assert!(seen.insert(rd.as_ptr() as usize));
        }
        assert_eq!(seen.len(), 8);
    }
}
