// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded-parallel execution of mappers over a stream of items.

use crate::macros::log_debug;
use crate::signal::Signal;
use crate::writer::Writer;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use crossbeam_utils::sync::WaitGroup;
use std::sync::Arc;
use std::thread;

/// Releases one worker slot when dropped, including during a panic unwind.
struct Slot {
    tokens: Receiver<()>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // The pool put a token in before this slot was handed out, so there
        // is always one to take back.
        let _ = self.tokens.try_recv();
    }
}

/// Drives up to `workers` concurrent mapper threads over `input`, feeding
/// their outputs into `collector`.
///
/// Returns once the input is exhausted or either signal is raised, after
/// every in-flight mapper has finished. The collector closes when the last
/// output handle is dropped on return.
pub(crate) fn execute_mappers<T, U, F>(
    ctx: Signal,
    mapper: F,
    input: Receiver<T>,
    collector: Sender<U>,
    done: Signal,
    workers: usize,
) where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T, &Writer<U>) + Send + Sync + 'static,
{
    let mapper = Arc::new(mapper);
    let in_flight = WaitGroup::new();
    let (token_tx, token_rx) = bounded::<()>(workers);
    let writer = Writer::new(ctx.clone(), collector, done.clone());

    loop {
        select! {
            recv(ctx.receiver()) -> _ => break,
            recv(done.receiver()) -> _ => break,
            send(token_tx, ()) -> res => {
                if res.is_err() {
                    break;
                }
                let Ok(item) = input.recv() else {
                    let _ = token_rx.recv();
                    break;
                };

                let slot = Slot { tokens: token_rx.clone() };
                let task = in_flight.clone();
                let writer = writer.clone();
                let mapper = mapper.clone();
                thread::spawn(move || {
                    let _slot = slot;
                    let _task = task;
                    mapper(item, &writer);
                });
            }
        }
    }

    log_debug!("[pool] Waiting for in-flight mappers...");
    in_flight.wait();
    log_debug!("[pool] All mappers finished, closing the collector.");
}
