//! Hybrid shared/exclusive access gate for the native speech engine.
//!
//! The engine tolerates a small number of simultaneous synthesis calls but a
//! voice-library reload must see a quiescent engine and must block everything
//! else for its duration. [`AccessGate`] provides both regimes in one
//! primitive: a counting semaphore with `max` shared slots plus an atomic
//! "take all slots" upgrade used by reloads.
//!
//! # Ordering contract
//!
//! Waiter registration happens when `acquire_shared` / `acquire_exclusive`
//! is *called*, not when the returned future is first polled. Call order is
//! therefore grant order, which the coordinator relies on to keep its reload
//! queue aligned with exclusive grants:
//!
//! - shared grants are strict FIFO among shared waiters;
//! - an exclusive request reserves full capacity immediately — no shared
//!   request issued after it can be admitted until the exclusive holder is
//!   done;
//! - concurrent exclusive requests are served in call order.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Cloneable handle to the gate. All clones share one slot pool.
#[derive(Clone)]
pub struct AccessGate {
    inner: Arc<Inner>,
}

struct Inner {
    max: usize,
    state: Mutex<GateState>,
}

struct GateState {
    /// Slots currently held, including slots reserved by a pending
    /// exclusive request. Waiters exist only while `held == max`.
    held: usize,
    waiters: VecDeque<Waiter>,
}

enum Waiter {
    Shared(oneshot::Sender<SharedPermit>),
    Exclusive {
        /// Shared releases still outstanding before the grant fires.
        remaining: usize,
        tx: oneshot::Sender<ExclusivePermit>,
    },
}

/// A granted shared slot. Dropping it returns the slot, handing it directly
/// to the head waiter if one is queued.
pub struct SharedPermit {
    gate: AccessGate,
}

impl std::fmt::Debug for SharedPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPermit").finish_non_exhaustive()
    }
}

/// Exclusive ownership of all `max` slots. Dropping it returns capacity one
/// slot at a time, waking queued waiters in FIFO order.
pub struct ExclusivePermit {
    gate: AccessGate,
}

impl std::fmt::Debug for ExclusivePermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusivePermit").finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Create a gate admitting up to `max` concurrent shared holders.
    ///
    /// # Panics
    /// Panics if `max` is zero.
    pub fn new(max: usize) -> Self {
        assert!(max >= 1, "AccessGate requires max >= 1");
        Self {
            inner: Arc::new(Inner {
                max,
                state: Mutex::new(GateState {
                    held: 0,
                    waiters: VecDeque::new(),
                }),
            }),
        }
    }

    /// Maximum number of concurrent shared holders.
    pub fn max(&self) -> usize {
        self.inner.max
    }

    /// Request a shared slot. The waiter is enqueued before this returns;
    /// await the result to receive the permit.
    pub fn acquire_shared(&self) -> SharedAcquire {
        let mut state = self.inner.state.lock().unwrap();
        if state.held < self.inner.max {
            state.held += 1;
            SharedAcquire {
                _gate: self.clone(),
                inner: Acquire::Ready(Some(SharedPermit { gate: self.clone() })),
            }
        } else {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(Waiter::Shared(tx));
            SharedAcquire {
                _gate: self.clone(),
                inner: Acquire::Waiting(rx),
            }
        }
    }

    /// Request exclusive ownership of all slots. Full capacity is reserved
    /// immediately: from this call on, no new shared request is admitted
    /// until the granted permit has been dropped. The grant itself fires
    /// once every currently-active holder has released.
    pub fn acquire_exclusive(&self) -> ExclusiveAcquire {
        let mut state = self.inner.state.lock().unwrap();
        if state.held == 0 {
            state.held = self.inner.max;
            ExclusiveAcquire {
                _gate: self.clone(),
                inner: Acquire::Ready(Some(ExclusivePermit { gate: self.clone() })),
            }
        } else {
            let (tx, rx) = oneshot::channel();
            let remaining = state.held;
            state.held = self.inner.max;
            state.waiters.push_back(Waiter::Exclusive { remaining, tx });
            ExclusiveAcquire {
                _gate: self.clone(),
                inner: Acquire::Waiting(rx),
            }
        }
    }

    /// Return one slot, handing it to the head waiter if any.
    ///
    /// The permit is sent through the waiter's channel outside the state
    /// lock. If the waiting future was dropped in the meantime the send
    /// fails and the returned permit drops, which re-enters this function
    /// and passes the slot on to the next waiter.
    fn release_one(&self) {
        let granted = {
            let mut guard = self.inner.state.lock().unwrap();
            let state = &mut *guard;
            state.held -= 1;
            match state.waiters.front_mut() {
                None => None,
                Some(Waiter::Shared(_)) => {
                    state.held += 1;
                    match state.waiters.pop_front() {
                        Some(Waiter::Shared(tx)) => Some(Grant::Shared(tx)),
                        _ => unreachable!(),
                    }
                }
                Some(Waiter::Exclusive { remaining, .. }) => {
                    // The freed slot is absorbed into the exclusive
                    // reservation; the grant fires when the last one lands.
                    state.held += 1;
                    *remaining -= 1;
                    if *remaining == 0 {
                        match state.waiters.pop_front() {
                            Some(Waiter::Exclusive { tx, .. }) => Some(Grant::Exclusive(tx)),
                            _ => unreachable!(),
                        }
                    } else {
                        None
                    }
                }
            }
        };

        match granted {
            None => {}
            Some(Grant::Shared(tx)) => {
                let _ = tx.send(SharedPermit { gate: self.clone() });
            }
            Some(Grant::Exclusive(tx)) => {
                let _ = tx.send(ExclusivePermit { gate: self.clone() });
            }
        }
    }
}

enum Grant {
    Shared(oneshot::Sender<SharedPermit>),
    Exclusive(oneshot::Sender<ExclusivePermit>),
}

impl Drop for SharedPermit {
    fn drop(&mut self) {
        self.gate.release_one();
    }
}

impl Drop for ExclusivePermit {
    fn drop(&mut self) {
        // Staged release: capacity returns one slot at a time, waking
        // queued shared waiters fairly, exactly `max` times.
        for _ in 0..self.gate.inner.max {
            self.gate.release_one();
        }
    }
}

enum Acquire<P> {
    Ready(Option<P>),
    Waiting(oneshot::Receiver<P>),
}

impl<P> Acquire<P> {
    fn poll_permit(&mut self, cx: &mut Context<'_>) -> Poll<P> {
        match self {
            Acquire::Ready(slot) => {
                Poll::Ready(slot.take().expect("acquire future polled after completion"))
            }
            Acquire::Waiting(rx) => Pin::new(rx).poll(cx).map(|res| match res {
                Ok(permit) => permit,
                // The future keeps the gate alive, so the sender can only
                // disappear through the unreachable drop of the gate queue.
                Err(_) => unreachable!("gate dropped while a waiter held a handle"),
            }),
        }
    }
}

/// Future returned by [`AccessGate::acquire_shared`].
pub struct SharedAcquire {
    _gate: AccessGate,
    inner: Acquire<SharedPermit>,
}

impl Future for SharedAcquire {
    type Output = SharedPermit;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_permit(cx)
    }
}

/// Future returned by [`AccessGate::acquire_exclusive`].
pub struct ExclusiveAcquire {
    _gate: AccessGate,
    inner: Acquire<ExclusivePermit>,
}

impl Future for ExclusiveAcquire {
    type Output = ExclusivePermit;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_permit(cx)
    }
}
