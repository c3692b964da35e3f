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

use crate::point::Point;
use std::sync::Mutex;

/// A handle into a `PointPool` slot. Never a raw pointer: the pool is the
/// sole owner of the backing storage, and a handle is only ever valid until
/// the batch it belongs to is `release`d.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointHandle(u32);

impl PointHandle {
    #[cfg(test)]
    pub fn for_test(index: u32) -> Self {
        PointHandle(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

struct Slot {
    point: Point,
    payload: Vec<u8>,
}

struct Inner {
    point_size: usize,
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

/// A free-list-backed arena of fixed-size point payloads. Bulk insertion
/// copies each point's native-schema bytes into a slot here rather than
/// allocating a fresh `Vec` per point, bounding per-point heap traffic.
pub struct PointPool {
    inner: Mutex<Inner>,
}

impl PointPool {
    pub fn new(point_size: usize) -> Self {
        PointPool {
            inner: Mutex::new(Inner {
                point_size,
                slots: Vec::new(),
                free_list: Vec::new(),
            }),
        }
    }

    /// Copies `src` (which must be exactly `point_size` bytes) into a free
    /// slot, tags it with `point`'s coordinates, and returns a handle.
    pub fn acquire(&self, point: Point, src: &[u8]) -> PointHandle {
        let mut inner = self.inner.lock().unwrap();
        assert_eq!(
            inner.point_size,
            src.len(),
            "payload does not match this pool's point size"
        );
        if let Some(index) = inner.free_list.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.point = point;
            slot.payload.clear();
            slot.payload.extend_from_slice(src);
            return PointHandle(index);
        }
        let index = inner.slots.len() as u32;
        inner.slots.push(Slot {
            point,
            payload: src.to_vec(),
        });
        PointHandle(index)
    }

    /// Reads back a handle's point and payload bytes. Panics if the handle
    /// was already released - a released handle must never be reused.
    pub fn get(&self, handle: PointHandle) -> (Point, Vec<u8>) {
        let inner = self.inner.lock().unwrap();
        let slot = &inner.slots[handle.index()];
        (slot.point, slot.payload.clone())
    }

    /// Returns a batch of handles to the free list, invalidating them all.
    pub fn release(&self, handles: &[PointHandle]) {
        let mut inner = self.inner.lock().unwrap();
        for &handle in handles {
            inner.free_list.push(handle.0);
        }
    }

    pub fn point_size(&self) -> usize {
        self.inner.lock().unwrap().point_size
    }

    pub fn resident_slots(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.slots.len() - inner.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_round_trips_payload() {
        let pool = PointPool::new(4);
        let handle = pool.acquire(Point::new(1., 2., 3.), &[1, 2, 3, 4]);
        let (point, payload) = pool.get(handle);
        assert_eq!(Point::new(1., 2., 3.), point);
        assert_eq!(vec![1, 2, 3, 4], payload);
    }

    #[test]
    fn release_reuses_slots() {
        let pool = PointPool::new(4);
        let a = pool.acquire(Point::new(0., 0., 0.), &[0, 0, 0, 0]);
        assert_eq!(1, pool.resident_slots());
        pool.release(&[a]);
        assert_eq!(0, pool.resident_slots());
        let b = pool.acquire(Point::new(1., 1., 1.), &[9, 9, 9, 9]);
        assert_eq!(1, pool.resident_slots());
        let (point, payload) = pool.get(b);
        assert_eq!(Point::new(1., 1., 1.), point);
        assert_eq!(vec![9, 9, 9, 9], payload);
    }
}
