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

//! Process-wide, observational atomics tracking resident chunk count and
//! resident chunk byte footprint. Bumped exactly once per chunk at
//! construction time - the source this spec is drawn from bumps `chunk_cnt`
//! twice (once in a base constructor, once again in the sparse
//! constructor), which the spec calls out as a bug; we do not reproduce it.

use std::sync::atomic::{AtomicUsize, Ordering};

static CHUNK_MEM: AtomicUsize = AtomicUsize::new(0);
static CHUNK_CNT: AtomicUsize = AtomicUsize::new(0);

pub fn chunk_created(point_size: usize) {
    CHUNK_CNT.fetch_add(1, Ordering::Release);
    let _ = point_size;
}

pub fn chunk_dropped() {
    CHUNK_CNT.fetch_sub(1, Ordering::Release);
}

pub fn add_points(count: usize, point_size: usize) {
    CHUNK_MEM.fetch_add(count * point_size, Ordering::Release);
}

pub fn sub_points(count: usize, point_size: usize) {
    CHUNK_MEM.fetch_sub(count * point_size, Ordering::Release);
}

pub fn chunk_mem() -> usize {
    CHUNK_MEM.load(Ordering::Acquire)
}

pub fn chunk_cnt() -> usize {
    CHUNK_CNT.load(Ordering::Acquire)
}
