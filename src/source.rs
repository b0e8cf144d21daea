// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Source pump: runs the user producer on a dedicated thread.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread;

/// Spawns `generate` on its own thread and returns the channel it feeds.
///
/// The source is a rendezvous channel: the producer blocks on each send
/// until a worker takes the item. It closes when the producer returns and
/// the sender (and any clones the producer made) is dropped; a panicking
/// producer ends the pump early, and the pipeline completes with the items
/// produced so far.
///
/// Sends fail once every consumer is gone, so a producer that checks
/// [`Sender::send`] results terminates promptly when the pipeline has
/// stopped pulling:
///
/// ```rust
/// # use parafold::{build_source, Sender};
/// let source = build_source(|tx: Sender<u32>| {
///     for i in 0..3 {
///         if tx.send(i).is_err() {
///             return;
///         }
///     }
/// });
/// assert_eq!(source.iter().sum::<u32>(), 3);
/// ```
pub fn build_source<T, G>(generate: G) -> Receiver<T>
where
    T: Send + 'static,
    G: FnOnce(Sender<T>) + Send + 'static,
{
    let (tx, rx) = bounded(0);
    thread::spawn(move || generate(tx));
    rx
}
