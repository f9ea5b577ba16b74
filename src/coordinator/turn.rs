//! Turn gate
//!
//! A monitor (one `Mutex`, one `Condvar`) that admits callers into an
//! exclusive region strictly in ticket order. Each word worker holds a ticket
//! equal to its sequence id; the gate starts at ticket 1.
//!
//! # Protocol
//!
//! ```text
//! wait_for(ticket)  -> blocks until turn == ticket, returns Turn
//! Turn              -> derefs to the guarded state (channel, output, ...)
//! drop(Turn)        -> turn += 1, notify_all
//! ```
//!
//! Releasing happens in `Drop`, so every exit path of the exclusive region
//! (normal return, `?`, panic) advances the turn and no later worker can be
//! left waiting. A panicking holder marks the gate aborted; so does an
//! explicit `Turn::abort`. Later holders check `is_aborted` and leave without
//! touching the state.
//!
//! Poisoning is ignored: the guarded state stays usable and the abort flag
//! already tells later holders to stop.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

struct GateState<T> {
    turn: usize,
    aborted: bool,
    inner: T,
}

/// Ticket-ordered monitor guarding a `T`
pub struct TurnGate<T> {
    state: Mutex<GateState<T>>,
    turn_changed: Condvar,
}

impl<T> TurnGate<T> {
    /// Gate whose first admitted ticket is `first_ticket`
    pub fn new(first_ticket: usize, inner: T) -> Self {
        Self {
            state: Mutex::new(GateState {
                turn: first_ticket,
                aborted: false,
                inner,
            }),
            turn_changed: Condvar::new(),
        }
    }

    /// Block until `ticket` is admitted
    ///
    /// Every ticket from the first one up to `ticket` must be taken by some
    /// caller, otherwise this waits forever.
    pub fn wait_for(&self, ticket: usize) -> Turn<'_, T> {
        let guard = self.lock();
        debug_assert!(guard.turn <= ticket, "ticket {} already served", ticket);

        let guard = self
            .turn_changed
            .wait_while(guard, |state| state.turn != ticket)
            .unwrap_or_else(PoisonError::into_inner);

        Turn {
            gate: self,
            guard,
            ticket,
        }
    }

    /// Ticket currently admitted (or next to be admitted)
    pub fn current(&self) -> usize {
        self.lock().turn
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    /// Take the guarded state back once no worker holds a reference
    pub fn into_inner(self) -> T {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .inner
    }

    fn lock(&self) -> MutexGuard<'_, GateState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access for one ticket; releases the turn on drop
pub struct Turn<'g, T> {
    gate: &'g TurnGate<T>,
    guard: MutexGuard<'g, GateState<T>>,
    ticket: usize,
}

impl<T> Turn<'_, T> {
    pub fn ticket(&self) -> usize {
        self.ticket
    }

    /// An earlier holder aborted the request
    pub fn is_aborted(&self) -> bool {
        self.guard.aborted
    }

    /// Mark the request aborted; every later holder sees `is_aborted`
    pub fn abort(&mut self) {
        self.guard.aborted = true;
    }
}

impl<T> Deref for Turn<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard.inner
    }
}

impl<T> DerefMut for Turn<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard.inner
    }
}

impl<T> Drop for Turn<'_, T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.guard.aborted = true;
        }
        self.guard.turn += 1;
        self.gate.turn_changed.notify_all();
    }
}
