// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Close-only broadcast signals, used for external cancellation and for the
//! pipeline's internal teardown barrier.

use crossbeam_channel::{bounded, never, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

/// Creates a connected [`Trigger`]/[`Signal`] pair.
pub fn signal() -> (Trigger, Signal) {
    let (tx, rx) = bounded(0);
    let trigger = Trigger {
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    (trigger, Signal { rx })
}

/// Observer half of a close-only broadcast pair.
///
/// All clones observe the same underlying signal. A raised signal stays
/// raised forever; there is no reset.
#[derive(Clone)]
pub struct Signal {
    rx: Receiver<()>,
}

impl Signal {
    /// A signal that is never raised, the default cancellation context of a
    /// pipeline run.
    pub fn never() -> Self {
        Self { rx: never() }
    }

    /// Whether the signal has been raised.
    pub fn is_raised(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The underlying receiver. Its `recv` operation becomes ready (with a
    /// disconnection error) once the signal is raised, which makes the
    /// signal selectable alongside data channels.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

/// Controller half of a close-only broadcast pair.
///
/// Raising is idempotent and clones share the same signal. Dropping the last
/// clone of a trigger also raises its signal.
#[derive(Clone)]
pub struct Trigger {
    tx: Arc<Mutex<Option<Sender<()>>>>,
}

impl Trigger {
    /// Raises the paired signal, waking every observer. Later calls are
    /// no-ops.
    pub fn raise(&self) {
        self.tx.lock().unwrap().take();
    }
}
