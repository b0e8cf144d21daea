// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![forbid(missing_docs, unsafe_code)]

mod engine;
mod error;
mod macros;
mod options;
mod pool;
mod signal;
mod source;
mod writer;

pub use crossbeam_channel::{Receiver, Sender};

pub use engine::{
    finish, finish_void, map, map_reduce, map_reduce_void, map_reduce_with_source, map_void,
    Canceler, Task, VoidTask,
};
pub use error::{BoxError, Error, Result};
pub use options::{Options, DEFAULT_WORKERS, MIN_WORKERS};
pub use signal::{signal, Signal, Trigger};
pub use source::build_source;
pub use writer::Writer;
