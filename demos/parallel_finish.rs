// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Simple program that runs a few effectful tasks in parallel with
//! `finish`.

use parafold::{finish, Task};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn main() -> parafold::Result<()> {
    let total = Arc::new(AtomicU64::new(0));
    let tasks: Vec<Task> = [2, 3, 5]
        .into_iter()
        .map(|n| {
            let total = total.clone();
            Box::new(move || {
                total.fetch_add(n, Ordering::SeqCst);
                Ok(())
            }) as Task
        })
        .collect();

    finish(tasks)?;
    println!("total: {}", total.load(Ordering::SeqCst));
    Ok(())
}
