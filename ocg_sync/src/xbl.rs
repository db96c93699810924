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

//! The Adaptive Cross-Boundary Lock (§4.3): a three-state futex word, spun
//! on first, then handed to a host futex wait once spinning has run out.
//! Grounded on `sgx_sync::sys::locks::futex::mutex::Mutex`, generalized so
//! the "wake the waiter" half can live on the untrusted side of the
//! boundary instead of inside the same process.

use core::sync::atomic::{AtomicU32, Ordering};
use ocg_types::GwResult;

pub const UNLOCKED: u32 = 0;
pub const LOCKED_NO_WAITERS: u32 = 1;
pub const LOCKED_WITH_WAITERS: u32 = 2;

/// Bound on the spin phase before promoting to a futex wait, matching the
/// teacher's `Mutex::spin` iteration count.
pub const RPC_SPINLOCK_TIMEOUT: u32 = 1000;

/// Issues the host `FUTEX(WAIT, ...)` OCALL that XBL's blocking phase
/// needs. Implemented by the Gateway's own `OCallCode::Futex` dispatch
/// path (§4.3 supplemental) so there is exactly one way a cross-boundary
/// syscall leaves the enclave.
///
/// Returns `Ok(())` once the word no longer holds `expected` (woken or
/// raced), `Err` with a retryable `Os(EAGAIN)` on the benign race where the
/// state had already moved, and any other `Err` is fatal (§4.3 step 5).
pub trait FutexWait {
    fn futex_wait(&self, word: &AtomicU32, expected: u32) -> GwResult<()>;
}

/// Wakes a waiter blocked on `word`. Issued by the RPC worker after it
/// stores `result` and unlocks, when the prior state was
/// `LOCKED_WITH_WAITERS`. This is host-side behavior; production code
/// never calls it from inside the enclave. It exists here so tests can
/// simulate the worker half of the protocol with the same lock word type.
pub trait FutexWake {
    fn futex_wake(&self, word: &AtomicU32);
}

/// The lock word embedded in a Request Descriptor.
#[derive(Debug)]
pub struct Lock {
    word: AtomicU32,
}

impl Lock {
    /// Step 1 of the RD lifecycle: initializes to `UNLOCKED`, then
    /// immediately claims sole ownership. The CAS this describes always
    /// succeeds (nothing else has seen the lock yet), so it's encoded
    /// directly as the locked initial state rather than performed as a
    /// runtime compare-exchange.
    pub fn new_locked() -> Self {
        Lock {
            word: AtomicU32::new(LOCKED_NO_WAITERS),
        }
    }

    pub fn state(&self) -> u32 {
        self.word.load(Ordering::Acquire)
    }

    /// Steps 3-5: spin for `RPC_SPINLOCK_TIMEOUT` iterations attempting to
    /// observe and claim an `UNLOCKED` word; on exhaustion, promote to
    /// `LOCKED_WITH_WAITERS` and block in a host futex wait, retrying the
    /// acquire CAS on every wake. Returns once the lock has been
    /// reacquired by this thread.
    pub fn wait_for_release<F: FutexWait>(&self, futex: &F) -> GwResult<()> {
        loop {
            for _ in 0..RPC_SPINLOCK_TIMEOUT {
                if self
                    .word
                    .compare_exchange_weak(
                        UNLOCKED,
                        LOCKED_NO_WAITERS,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    return Ok(());
                }
                core::hint::spin_loop();
            }

            match self.word.compare_exchange(
                LOCKED_NO_WAITERS,
                LOCKED_WITH_WAITERS,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {}
                Err(UNLOCKED) => {
                    // Worker released between our last failed spin CAS and
                    // the promotion attempt. Try to claim it directly
                    // instead of promoting a lock nobody holds.
                    if self
                        .word
                        .compare_exchange(
                            UNLOCKED,
                            LOCKED_NO_WAITERS,
                            Ordering::Acquire,
                            Ordering::Relaxed,
                        )
                        .is_ok()
                    {
                        return Ok(());
                    }
                    continue;
                }
                Err(LOCKED_WITH_WAITERS) => {}
                Err(_) => unreachable!("lock word holds an undefined state"),
            }

            match futex.futex_wait(&self.word, LOCKED_WITH_WAITERS) {
                Ok(()) => continue,
                Err(e) if e.is_retryable() => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Step 2, the worker's half: stores `UNLOCKED` with release semantics
    /// and reports whether a futex wake is owed (the prior state was
    /// `LOCKED_WITH_WAITERS`). Test-only in this crate — production
    /// unlocking happens on the untrusted side.
    pub fn release(&self) -> bool {
        self.word.swap(UNLOCKED, Ordering::Release) == LOCKED_WITH_WAITERS
    }

    pub fn wake<F: FutexWake>(&self, futex: &F) {
        futex.futex_wake(&self.word);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::sync::atomic::Ordering as StdOrdering;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// A futex stand-in built on a condvar, used only to validate XBL's
    /// state machine end to end without real host support.
    struct CondvarFutex {
        inner: std::sync::Mutex<()>,
        cv: std::sync::Condvar,
    }

    impl CondvarFutex {
        fn new() -> Self {
            CondvarFutex {
                inner: std::sync::Mutex::new(()),
                cv: std::sync::Condvar::new(),
            }
        }
    }

    impl FutexWait for CondvarFutex {
        fn futex_wait(&self, word: &AtomicU32, expected: u32) -> GwResult<()> {
            let guard = self.inner.lock().unwrap();
            if word.load(StdOrdering::Acquire) != expected {
                return Ok(());
            }
            let _ = self
                .cv
                .wait_timeout(guard, Duration::from_millis(200))
                .unwrap();
            Ok(())
        }
    }

    impl FutexWake for CondvarFutex {
        fn futex_wake(&self, _word: &AtomicU32) {
            let _guard = self.inner.lock().unwrap();
            self.cv.notify_all();
        }
    }

    #[test]
    fn uncontended_reacquire_spins_only() {
        let lock = Lock::new_locked();
        assert!(lock.release());
        let futex = CondvarFutex::new();
        lock.wait_for_release(&futex).unwrap();
        assert_eq!(lock.state(), LOCKED_NO_WAITERS);
    }

    #[test]
    fn promotes_and_wakes_under_contention() {
        let lock = Arc::new(Lock::new_locked());
        let futex = Arc::new(CondvarFutex::new());

        let waiter_lock = Arc::clone(&lock);
        let waiter_futex = Arc::clone(&futex);
        let waiter = thread::spawn(move || {
            waiter_lock.wait_for_release(&*waiter_futex).unwrap();
        });

        // Give the waiter time to exhaust its spin budget and promote to
        // LOCKED_WITH_WAITERS before the "worker" releases.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(lock.state(), LOCKED_WITH_WAITERS);

        let needs_wake = lock.release();
        assert!(needs_wake);
        lock.wake(&*futex);

        waiter.join().unwrap();
        assert_eq!(lock.state(), LOCKED_NO_WAITERS);
    }
}
