// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Simple program that computes the sum of squares of 0..10 with a
//! map/reduce pipeline.

use parafold::{Canceler, Options, Receiver, Sender, Writer};

fn main() -> parafold::Result<()> {
    let value = parafold::map_reduce(
        |source: Sender<i64>| {
            for i in 0..10 {
                if source.send(i).is_err() {
                    return;
                }
            }
        },
        |i: i64, writer: &Writer<i64>, _cancel: &Canceler| writer.write(i * i),
        |pipe: Receiver<i64>, writer: &Writer<i64>, _cancel: &Canceler| {
            writer.write(pipe.iter().sum());
        },
        Options::default(),
    )?;
    println!("result: {value}");
    Ok(())
}
