// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pipeline orchestration: stage wiring, the cancel-once protocol, and the
//! public entry points.

use crate::error::{Error, Result};
use crate::macros::{log_debug, log_error};
use crate::options::Options;
use crate::pool::execute_mappers;
use crate::signal::{signal, Signal, Trigger};
use crate::source::build_source;
use crate::writer::Writer;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// A fallible callback for [`finish`].
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// An infallible callback for [`finish_void`].
pub type VoidTask = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation capability handed to mappers and reducers.
///
/// Only the first call to [`cancel()`](Canceler::cancel) takes effect: it
/// records the error, drains the source so a blocked producer can finish,
/// and raises the teardown signal observed by every stage. Later calls are
/// no-ops, whichever stage they come from.
#[derive(Clone)]
pub struct Canceler {
    state: Arc<CancelState>,
}

struct CancelState {
    fired: AtomicBool,
    first_error: Mutex<Option<Error>>,
    drain_source: Box<dyn Fn() + Send + Sync>,
    done: Trigger,
}

impl Canceler {
    fn new<T: Send + 'static>(source: Receiver<T>, done: Trigger) -> Self {
        Self {
            state: Arc::new(CancelState {
                fired: AtomicBool::new(false),
                first_error: Mutex::new(None),
                drain_source: Box::new(move || drain(&source)),
                done,
            }),
        }
    }

    /// Cancels the run, recording `err` as the run's error. `None` is
    /// recorded as [`Error::Cancelled`].
    pub fn cancel(&self, err: Option<Error>) {
        if self.state.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let err = err.unwrap_or(Error::Cancelled);
        log_debug!("[engine] Cancelling the run: {err}");
        *self.state.first_error.lock().unwrap() = Some(err);
        (self.state.drain_source)();
        self.state.done.raise();
    }

    /// Raises the teardown signal without recording an error. Used on clean
    /// reducer completion; shares the trigger's idempotence with
    /// [`cancel()`](Canceler::cancel).
    fn finish(&self) {
        self.state.done.raise();
    }

    fn take_error(&self) -> Option<Error> {
        self.state.first_error.lock().unwrap().take()
    }
}

/// Runs `mapper` over the items emitted by `generate` and returns the
/// channel of mapper outputs for the caller to consume.
///
/// The channel closes once every item has been mapped. Raising the
/// cancellation signal in `options` stops the run early; outputs already
/// queued remain readable.
pub fn map<T, U, G, M>(generate: G, mapper: M, options: Options) -> Receiver<U>
where
    T: Send + 'static,
    U: Send + 'static,
    G: FnOnce(Sender<T>) + Send + 'static,
    M: Fn(T, &Writer<U>) + Send + Sync + 'static,
{
    let workers = options.clamped_workers();
    let ctx = options.cancel;
    let source = build_source(generate);
    let (collector_tx, collector_rx) = bounded(workers);

    thread::spawn(move || {
        execute_mappers(ctx, mapper, source, collector_tx, Signal::never(), workers);
    });

    collector_rx
}

/// Runs `mapper` for its side effects over the items emitted by `generate`,
/// returning once every item has been processed.
pub fn map_void<T, G, M>(generate: G, mapper: M, options: Options)
where
    T: Send + 'static,
    G: FnOnce(Sender<T>) + Send + 'static,
    M: Fn(T) + Send + Sync + 'static,
{
    drain(&map(
        generate,
        move |item, _writer: &Writer<()>| mapper(item),
        options,
    ));
}

/// Maps the items emitted by `generate` with bounded parallelism and
/// reduces the mapper outputs into a single value.
///
/// The reducer must write exactly one value on a successful run. Writing
/// none surfaces [`Error::NoOutput`]; writing more than one is a contract
/// violation and panics.
pub fn map_reduce<T, U, V, G, M, R>(
    generate: G,
    mapper: M,
    reducer: R,
    options: Options,
) -> Result<V>
where
    T: Send + 'static,
    U: Send + 'static,
    V: Send + 'static,
    G: FnOnce(Sender<T>) + Send + 'static,
    M: Fn(T, &Writer<U>, &Canceler) + Send + Sync + 'static,
    R: FnOnce(Receiver<U>, &Writer<V>, &Canceler) + Send + 'static,
{
    let source = build_source(generate);
    map_reduce_with_source(source, mapper, reducer, options)
}

/// Same as [`map_reduce`], reading items from a pre-built source channel
/// instead of running a producer.
pub fn map_reduce_with_source<T, U, V, M, R>(
    source: Receiver<T>,
    mapper: M,
    reducer: R,
    options: Options,
) -> Result<V>
where
    T: Send + 'static,
    U: Send + 'static,
    V: Send + 'static,
    M: Fn(T, &Writer<U>, &Canceler) + Send + Sync + 'static,
    R: FnOnce(Receiver<U>, &Writer<V>, &Canceler) + Send + 'static,
{
    let workers = options.clamped_workers();
    let ctx = options.cancel;
    let (collector_tx, collector_rx) = bounded::<U>(workers);
    let (output_tx, output_rx) = bounded::<V>(0);
    let (done_trigger, done) = signal();
    let canceler = Canceler::new(source.clone(), done_trigger);

    // Reducer stage. The deferred drain keeps late mapper outputs from
    // piling up in the collector, and the teardown signal is raised on every
    // exit path.
    let reducer_writer = Writer::new(ctx.clone(), output_tx, done.clone());
    let reducer_canceler = canceler.clone();
    let reducer_pipe = collector_rx.clone();
    thread::spawn(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            reducer(collector_rx, &reducer_writer, &reducer_canceler)
        }));
        drain(&reducer_pipe);
        match outcome {
            Ok(()) => reducer_canceler.finish(),
            Err(payload) => {
                log_error!("[engine] Reducer panicked, cancelling the run.");
                reducer_canceler.cancel(Some(Error::Panicked(panic_message(payload))));
            }
        }
        // Explicit drop for clarity: this closes the output channel.
        drop(reducer_writer);
    });

    // Mapper stage, with panics routed through the shared cancel
    // capability.
    let pool_canceler = canceler.clone();
    let pool_ctx = ctx.clone();
    let pool_done = done.clone();
    thread::spawn(move || {
        let mapper_canceler = pool_canceler;
        let wrapped = move |item: T, writer: &Writer<U>| {
            let run = catch_unwind(AssertUnwindSafe(|| mapper(item, writer, &mapper_canceler)));
            if let Err(payload) = run {
                log_error!("[engine] A mapper panicked, cancelling the run.");
                mapper_canceler.cancel(Some(Error::Panicked(panic_message(payload))));
            }
        };
        execute_mappers(pool_ctx, wrapped, source, collector_tx, pool_done, workers);
    });

    let received = output_rx.recv();
    let result = match canceler.take_error() {
        Some(err) => Err(err),
        None => match received {
            Ok(value) => Ok(value),
            Err(_) => Err(Error::NoOutput),
        },
    };

    // The reducer contract allows at most one output value; anything beyond
    // the first is a misuse of the writer.
    for _ in output_rx.iter() {
        panic!("the reducer wrote more than one value");
    }

    result
}

/// Maps and reduces like [`map_reduce`], for reducers that only produce
/// side effects.
pub fn map_reduce_void<T, U, G, M, R>(
    generate: G,
    mapper: M,
    reducer: R,
    options: Options,
) -> Result<()>
where
    T: Send + 'static,
    U: Send + 'static,
    G: FnOnce(Sender<T>) + Send + 'static,
    M: Fn(T, &Writer<U>, &Canceler) + Send + Sync + 'static,
    R: FnOnce(Receiver<U>, &Canceler) + Send + 'static,
{
    map_reduce(
        generate,
        mapper,
        move |pipe: Receiver<U>, writer: &Writer<()>, cancel: &Canceler| {
            reducer(pipe, cancel);
            // A placeholder output, so that the run completes like one with
            // a value-producing reducer. Never observed by the caller.
            writer.write(());
        },
        options,
    )
}

/// Runs every task in parallel, cancelling the run on the first error.
///
/// The worker count equals the number of tasks; an empty list succeeds
/// immediately. Tasks already running when one fails still run to
/// completion, so side effects may be partial.
pub fn finish(tasks: Vec<Task>) -> Result<()> {
    if tasks.is_empty() {
        return Ok(());
    }

    let workers = tasks.len();
    map_reduce_void(
        move |source: Sender<Task>| {
            for task in tasks {
                if source.send(task).is_err() {
                    return;
                }
            }
        },
        |task: Task, _writer: &Writer<()>, cancel: &Canceler| {
            if let Err(err) = task() {
                cancel.cancel(Some(err));
            }
        },
        |pipe: Receiver<()>, _cancel: &Canceler| drain(&pipe),
        Options {
            workers,
            ..Options::default()
        },
    )
}

/// Runs every task in parallel and waits for all of them to complete.
pub fn finish_void(tasks: Vec<VoidTask>) {
    if tasks.is_empty() {
        return;
    }

    let workers = tasks.len();
    map_void(
        move |source: Sender<VoidTask>| {
            for task in tasks {
                if source.send(task).is_err() {
                    return;
                }
            }
        },
        |task: VoidTask| task(),
        Options {
            workers,
            ..Options::default()
        },
    );
}

/// Consumes a channel until it closes.
fn drain<T>(rx: &Receiver<T>) {
    for _ in rx.iter() {}
}

/// Renders a panic payload the way panic messages appear on stderr.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "mapper or reducer panicked".to_string(),
        },
    }
}
