// Copyright 2016 The Cartographer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod disk;
mod mem;

pub use disk::DiskEndpoint;
pub use mem::MemEndpoint;

use crate::errors::*;
use std::thread;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 20;

/// Byte-addressed blob store. A chunk's `id` (its decimal string form) is
/// the path; implementations never need to understand hierarchical paths.
///
/// A single attempt is all this trait requires of an implementation -
/// `put_once`/`get_once` are expected to raise `ErrorKind::TransientEndpoint`
/// (carrying the attempt number they were passed) on failure, not retry
/// internally. Retrying belongs to `with_retry`, which every concrete
/// endpoint's public `put`/`get` call through, and which alone is entitled
/// to raise `ErrorKind::FatalEndpoint` once `MAX_ATTEMPTS` is exhausted.
pub trait Endpoint: Send + Sync {
    fn put_once(&self, path: &str, bytes: &[u8], attempt: u32) -> Result<()>;
    fn get_once(&self, path: &str, attempt: u32) -> Result<Vec<u8>>;

    fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        with_retry(path, |attempt| self.put_once(path, bytes, attempt))
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        with_retry(path, |attempt| self.get_once(path, attempt))
    }
}

/// Retries `op` up to `MAX_ATTEMPTS` times, sleeping `k` seconds after the
/// `k`-th failed attempt before trying again. On exhaustion, surfaces
/// `ErrorKind::FatalEndpoint` rather than aborting the process.
fn with_retry<T>(path: &str, mut op: impl FnMut(u32) -> Result<T>) -> Result<T> {
    for attempt in 1..=MAX_ATTEMPTS {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt == MAX_ATTEMPTS {
                    log::error!(
                        "endpoint operation on {} gave up after {} attempts: {}",
                        path,
                        MAX_ATTEMPTS,
                        err
                    );
                    return Err(ErrorKind::FatalEndpoint(path.to_string()).into());
                }
                log::warn!(
                    "endpoint operation on {} failed (attempt {}/{}): {}",
                    path,
                    attempt,
                    MAX_ATTEMPTS,
                    err
                );
                sleep_backoff(attempt);
            }
        }
    }
    unreachable!("loop always returns by the last iteration")
}

#[cfg(not(test))]
fn sleep_backoff(attempt: u32) {
    thread::sleep(Duration::from_secs(u64::from(attempt)));
}

// Tests inject failures that are expected to be retried dozens of times
// across the suite; sleeping real seconds would make the suite
// impractically slow, so the backoff duration collapses to near-zero here
// while keeping the attempt-counting logic identical.
#[cfg(test)]
fn sleep_backoff(_attempt: u32) {
    thread::sleep(Duration::from_millis(1));
}
