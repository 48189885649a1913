//! Single-shot completion cell shared by the dispatcher and the ready-state
//! handler it registers.
//!
//! The cell holds the caller's callback until exactly one of these happens:
//! a terminal snapshot is observed, setup fails, or the handler is released
//! without a terminal snapshot after setup finished. Whichever comes first
//! takes the callback; everything later is a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::dispatch::Outcome;
use crate::error::DispatchError;

pub(crate) type DispatchResult = Result<Outcome, DispatchError>;

struct Slot<F> {
    callback: Option<F>,
    setup_finished: bool,
    handler_released: bool,
}

pub(crate) struct Completion<F> {
    slot: Mutex<Slot<F>>,
}

impl<F> Completion<F>
where
    F: FnOnce(DispatchResult),
{
    pub(crate) fn new(callback: F) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot {
                callback: Some(callback),
                setup_finished: false,
                handler_released: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slot<F>> {
        // A panicking callback must not wedge the cell.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `result` if nothing has been delivered yet. The callback runs
    /// after the lock is released.
    pub(crate) fn resolve(&self, result: DispatchResult) -> bool {
        let callback = self.lock().callback.take();
        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => {
                warn!("dropping duplicate completion: {}", describe(&result));
                false
            }
        }
    }

    /// Mark setup as finished. If the handler was already released without
    /// reaching a terminal state, the request can no longer complete.
    pub(crate) fn finish_setup(&self) {
        let callback = {
            let mut slot = self.lock();
            slot.setup_finished = true;
            if slot.handler_released {
                slot.callback.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback(Err(DispatchError::Abandoned));
        }
    }

    /// Called when the ready-state handler is dropped.
    fn release_handler(&self) {
        let callback = {
            let mut slot = self.lock();
            slot.handler_released = true;
            if slot.setup_finished {
                slot.callback.take()
            } else {
                None
            }
        };
        if let Some(callback) = callback {
            callback(Err(DispatchError::Abandoned));
        }
    }
}

fn describe(result: &DispatchResult) -> String {
    match result {
        Ok(outcome) => format!("status {}", outcome.handle.status),
        Err(err) => err.to_string(),
    }
}

/// Owned by the ready-state handler; reports `Abandoned` when the handler
/// goes away without having delivered a result.
pub(crate) struct HandlerGuard<F>
where
    F: FnOnce(DispatchResult),
{
    completion: Arc<Completion<F>>,
}

impl<F> HandlerGuard<F>
where
    F: FnOnce(DispatchResult),
{
    pub(crate) fn new(completion: &Arc<Completion<F>>) -> Self {
        Self {
            completion: Arc::clone(completion),
        }
    }

    pub(crate) fn resolve(&self, result: DispatchResult) -> bool {
        self.completion.resolve(result)
    }
}

impl<F> Drop for HandlerGuard<F>
where
    F: FnOnce(DispatchResult),
{
    fn drop(&mut self) {
        self.completion.release_handler();
    }
}
