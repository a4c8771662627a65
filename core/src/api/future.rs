/*
 * future.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Netapi, an HTTP API client library.
 *
 * Netapi is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Netapi is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Netapi.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Result future shared between the request task and the caller.
//!
//! The first of completion, failure and cancellation claims a single atomic state, recording which
//! of the three it was; later signals are no-ops. `get()` blocks on a condition variable; the future can also be `.await`ed.

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::error::{ApiError, ApiResult};

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Outcome {
    Completed = 1,
    Failed = 2,
    Cancelled = 3,
}

const PENDING: u8 = 0;

/// "Already terminal" state. Consumers poll it between records so nothing is delivered once a
/// terminal state has been claimed.
#[derive(Debug, Clone, Default)]
pub struct TerminalFlag(Arc<AtomicU8>);

impl TerminalFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move from pending to `outcome`. True only for the first caller.
    pub fn claim(&self, outcome: Outcome) -> bool {
        self.0
            .compare_exchange(PENDING, outcome as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire) != PENDING
    }

    /// The outcome that won, if any.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.0.load(Ordering::Acquire) {
            1 => Some(Outcome::Completed),
            2 => Some(Outcome::Failed),
            3 => Some(Outcome::Cancelled),
            _ => None,
        }
    }
}

enum Slot<T> {
    Pending(Option<Waker>),
    Ready(ApiResult<T>),
    Taken,
}

/// Completion state for one request.
pub(crate) struct Shared<T> {
    terminal: TerminalFlag,
    slot: Mutex<Slot<T>>,
    ready: Condvar,
    cancel: Notify,
}

impl<T> Shared<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            terminal: TerminalFlag::new(),
            slot: Mutex::new(Slot::Pending(None)),
            ready: Condvar::new(),
            cancel: Notify::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn terminal_flag(&self) -> TerminalFlag {
        self.terminal.clone()
    }

    pub(crate) fn claim(&self, outcome: Outcome) -> bool {
        self.terminal.claim(outcome)
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal.is_set()
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.terminal.outcome()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.outcome() == Some(Outcome::Cancelled)
    }

    /// Store the result and wake waiters. Callers must have won `claim`.
    pub(crate) fn resolve(&self, result: ApiResult<T>) {
        let mut slot = self.lock();
        if let Slot::Pending(waker) = mem::replace(&mut *slot, Slot::Ready(result)) {
            if let Some(waker) = waker {
                waker.wake();
            }
        }
        drop(slot);
        self.ready.notify_all();
    }

    /// Resolves when `cancel()` has been requested. A cancel before the first poll is not lost.
    pub(crate) async fn cancel_requested(&self) {
        self.cancel.notified().await
    }

    fn is_resolved(&self) -> bool {
        !matches!(*self.lock(), Slot::Pending(_))
    }

    fn take(slot: &mut Slot<T>) -> ApiResult<T> {
        match mem::replace(slot, Slot::Taken) {
            Slot::Ready(result) => result,
            Slot::Pending(_) | Slot::Taken => {
                Err(ApiError::protocol("response result already taken"))
            }
        }
    }
}

/// Type-erased cancellation used by `CancelHandle`.
trait Cancel: Send + Sync {
    fn cancel(&self) -> bool;
}

impl<T: Send> Cancel for Shared<T> {
    fn cancel(&self) -> bool {
        if !self.claim(Outcome::Cancelled) {
            return false;
        }
        self.resolve(Err(ApiError::Cancelled));
        self.cancel.notify_one();
        true
    }
}

/// Cloneable handle that cancels the request from any thread.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<dyn Cancel>,
}

impl CancelHandle {
    /// Cancel the request. False if it already completed, failed or was cancelled.
    pub fn cancel(&self) -> bool {
        self.inner.cancel()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelHandle")
    }
}

/// Caller side of an in-flight request.
pub struct ResponseFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> ResponseFuture<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Block until the request reaches a terminal state.
    pub fn get(self) -> ApiResult<T> {
        let mut slot = self.shared.lock();
        while matches!(*slot, Slot::Pending(_)) {
            slot = self
                .shared
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Shared::take(&mut slot)
    }

    /// Block for at most `timeout`. The request keeps running when the wait times out.
    pub fn get_timeout(self, timeout: Duration) -> ApiResult<T> {
        if !self.wait_timeout(timeout) {
            return Err(ApiError::Timeout(timeout));
        }
        let mut slot = self.shared.lock();
        Shared::take(&mut slot)
    }

    /// Wait for a terminal state for at most `timeout`; true if one was reached.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.lock();
        while matches!(*slot, Slot::Pending(_)) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            slot = self
                .shared
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Cancel the request: no record is delivered afterwards and the result is `ApiError::Cancelled`.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        let inner: Arc<dyn Cancel> = self.shared.clone();
        CancelHandle { inner }
    }

    pub fn is_done(&self) -> bool {
        self.shared.is_resolved()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl<T> Future for ResponseFuture<T> {
    type Output = ApiResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.lock();
        if let Slot::Pending(waker) = &mut *slot {
            *waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        Poll::Ready(Shared::take(&mut slot))
    }
}

impl<T> fmt::Debug for ResponseFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("done", &self.shared.is_resolved())
            .field("cancelled", &self.shared.is_cancelled())
            .finish()
    }
}
