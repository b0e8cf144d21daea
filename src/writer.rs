// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Guarded hand-off port for mapper and reducer outputs.

use crate::signal::Signal;
use crossbeam_channel::{select, Sender};

/// Output port handed to mappers and reducers.
///
/// Writes are discarded once the run is cancelled or torn down, so user code
/// may call [`write()`](Writer::write) at any time without risking a
/// deadlock or a send to a dead channel.
pub struct Writer<T> {
    ctx: Signal,
    out: Sender<T>,
    done: Signal,
}

impl<T> Writer<T> {
    pub(crate) fn new(ctx: Signal, out: Sender<T>, done: Signal) -> Self {
        Self { ctx, out, done }
    }

    /// Sends `v` downstream, or discards it if the run is being torn down.
    ///
    /// May block until the consuming stage is ready to receive. A write that
    /// is in flight when teardown starts is abandoned.
    pub fn write(&self, v: T) {
        if self.ctx.is_raised() || self.done.is_raised() {
            return;
        }
        select! {
            send(self.out, v) -> res => {
                let _ = res;
            }
            recv(self.ctx.receiver()) -> _ => {}
            recv(self.done.receiver()) -> _ => {}
        }
    }
}

// A derived impl would require `T: Clone`; the channel handle clones
// regardless of the element type.
impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            out: self.out.clone(),
            done: self.done.clone(),
        }
    }
}
