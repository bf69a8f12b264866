/*
 * hooks.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Optional bundler hooks and the combinators that chain them.
 */

//! Hooks and hook composition.
//!
//! A bundler hook may answer synchronously or hand back a future. Both shapes
//! are represented by [`HookResult`]; a synchronous answer stays synchronous
//! through composition whenever no composed hook suspends.
//!
//! Two combinators layer a second plugin (the hot-reload layer) on top of the
//! base plugin:
//!
//! - [`run_first`]: try the first hook, fall back to the second when the first
//!   produced nothing.
//! - [`run_after`]: invoke the first hook, then the second, and settle with the
//!   first hook's value.
//!
//! Hooks are single-threaded: futures are `!Send` and shared state lives in
//! `Rc`/`RefCell`.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::context::Host;

/// Outcome of invoking a hook: either already available or still running.
pub enum HookResult<T> {
    Ready(T),
    Pending(LocalBoxFuture<'static, T>),
}

impl<T: 'static> HookResult<T> {
    /// Wrap a future as a pending result
    pub fn pending(future: impl Future<Output = T> + 'static) -> Self {
        Self::Pending(future.boxed_local())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wait for the value.
    pub async fn resolve(self) -> T {
        match self {
            Self::Ready(value) => value,
            Self::Pending(future) => future.await,
        }
    }

    /// Get the value if it was produced synchronously
    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }
}

impl<T> fmt::Debug for HookResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("HookResult::Ready(..)"),
            Self::Pending(_) => f.write_str("HookResult::Pending(..)"),
        }
    }
}

/// Values a hook can produce.
///
/// Every hook return type has a "nothing" value: what an absent hook
/// produces, and what makes [`run_first`] move on to the next hook.
pub trait HookValue: Sized + 'static {
    /// Value of a hook that isn't there
    fn absent() -> Self;

    /// Whether this value is the "nothing" value
    fn is_absent(&self) -> bool;

    /// Combine this value with the value of a hook sequenced after it.
    ///
    /// The earlier value wins unless the later hook failed.
    fn settle(self, _later: Self) -> Self {
        self
    }
}

impl HookValue for () {
    fn absent() -> Self {}

    fn is_absent(&self) -> bool {
        true
    }
}

impl<T: 'static> HookValue for Option<T> {
    fn absent() -> Self {
        None
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: HookValue, E: 'static> HookValue for Result<T, E> {
    fn absent() -> Self {
        Ok(T::absent())
    }

    fn is_absent(&self) -> bool {
        matches!(self, Ok(value) if value.is_absent())
    }

    fn settle(self, later: Self) -> Self {
        match (self, later) {
            (Ok(_), Err(err)) => Err(err),
            (earlier, _) => earlier,
        }
    }
}

/// Hook implementation: takes the host and owned arguments.
pub type HookFn<A, T> = Rc<dyn Fn(Host, A) -> HookResult<T>>;

/// An optional hook.
pub enum Hook<A, T> {
    Absent,
    Present(HookFn<A, T>),
}

impl<A: 'static, T: HookValue> Hook<A, T> {
    pub fn new(f: impl Fn(Host, A) -> HookResult<T> + 'static) -> Self {
        Self::Present(Rc::new(f))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Invoke the hook. An absent hook answers [`HookValue::absent`]
    /// synchronously.
    pub fn call(&self, host: Host, args: A) -> HookResult<T> {
        match self {
            Self::Absent => HookResult::Ready(T::absent()),
            Self::Present(f) => f(host, args),
        }
    }
}

impl<A, T> Clone for Hook<A, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Present(f) => Self::Present(Rc::clone(f)),
        }
    }
}

impl<A, T> Default for Hook<A, T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<A, T> fmt::Debug for Hook<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Hook::Absent"),
            Self::Present(_) => f.write_str("Hook::Present(..)"),
        }
    }
}

/// Chain two hooks so that `b` only runs when `a` produced nothing.
///
/// If `a` answers synchronously with a value, `b` is never invoked and the
/// answer stays synchronous. If `a` suspends, the combined result is pending
/// and `b` is invoked once `a` settled with nothing. An absent hook on either
/// side yields the other hook unchanged.
pub fn run_first<A, T>(a: Hook<A, T>, b: Hook<A, T>) -> Hook<A, T>
where
    A: Clone + 'static,
    T: HookValue,
{
    let (a, b) = match (a, b) {
        (Hook::Absent, b) => return b,
        (a, Hook::Absent) => return a,
        (Hook::Present(a), Hook::Present(b)) => (a, b),
    };

    Hook::new(move |host: Host, args: A| match a(host.clone(), args.clone()) {
        HookResult::Ready(value) if value.is_absent() => b(host, args),
        HookResult::Ready(value) => HookResult::Ready(value),
        HookResult::Pending(first) => {
            let b = Rc::clone(&b);
            HookResult::pending(async move {
                let value = first.await;
                if value.is_absent() {
                    b(host, args).resolve().await
                } else {
                    value
                }
            })
        }
    })
}

/// Sequence `b` after `a`, settling with `a`'s value.
///
/// `a` is invoked immediately. The combined result is always pending: `b` is
/// invoked the first time it is polled, after `a` has been invoked (and has
/// run up to its first suspension point), and the result settles once both
/// finished. `b`'s value is discarded unless it is a failure, which then
/// becomes the combined result. An absent `b` leaves `a` unchanged.
pub fn run_after<A, T>(a: Hook<A, T>, b: Hook<A, T>) -> Hook<A, T>
where
    A: Clone + 'static,
    T: HookValue,
{
    let b = match b {
        Hook::Absent => return a,
        Hook::Present(b) => b,
    };

    Hook::new(move |host: Host, args: A| {
        let first = a.call(host.clone(), args.clone()).resolve();
        let b = Rc::clone(&b);
        let second = async move { b(host, args).resolve().await };
        HookResult::pending(async move {
            let (earlier, later) = futures::join!(first, second);
            earlier.settle(later)
        })
    })
}
