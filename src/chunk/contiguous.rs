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

use super::{write_record, Chunk, ChunkType};
use crate::counters;
use crate::errors::*;
use crate::id::Id;
use crate::point::Point;
use crate::pool::{PointHandle, PointPool};
use crate::tube::Tube;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A dense, pre-sized range of tubes, one per node-id in
/// `[id, id + max_points)`. Mutex-guarded for uniformity with
/// `SparseChunk`; in practice a `Builder` hands one chunk to exactly one
/// worker's subtree at a time, so the lock is never contended.
pub struct ContiguousChunk {
    id: Id,
    max_points: u64,
    num_points: AtomicU64,
    tubes: Mutex<Vec<Tube>>,
}

impl ContiguousChunk {
    pub fn new(id: Id, max_points: u64) -> Self {
        counters::chunk_created(0);
        let mut tubes = Vec::with_capacity(max_points as usize);
        tubes.resize_with(max_points as usize, Tube::new);
        ContiguousChunk {
            id,
            max_points,
            num_points: AtomicU64::new(0),
            tubes: Mutex::new(tubes),
        }
    }
}

impl Drop for ContiguousChunk {
    fn drop(&mut self) {
        counters::chunk_dropped();
    }
}

impl Chunk for ContiguousChunk {
    fn id(&self) -> &Id {
        &self.id
    }

    fn num_points(&self) -> u64 {
        self.num_points.load(Ordering::Acquire)
    }

    fn chunk_type(&self) -> ChunkType {
        ChunkType::Contiguous
    }

    fn normalize(&self, raw_id: &Id) -> Result<u64> {
        let end = self.id.add_u64(self.max_points);
        if *raw_id < self.id || *raw_id >= end {
            return Err(ErrorKind::OutOfRangeId(
                raw_id.to_u64_saturating(),
                self.id.to_u64_saturating(),
                end.to_u64_saturating(),
            )
            .into());
        }
        Ok(raw_id.sub(&self.id).simple())
    }

    fn insert(&self, pool: &PointPool, normalized: u64, tick: u64, point: Point, payload: &[u8]) -> bool {
        let mut tubes = self.tubes.lock().unwrap();
        let tube = &mut tubes[normalized as usize];
        let (created, cell) = tube.get_cell(tick);
        let handle = pool.acquire(point, payload);
        cell.set(point, handle);
        if created {
            self.num_points.fetch_add(1, Ordering::AcqRel);
            counters::add_points(1, pool.point_size());
        }
        created
    }

    fn serialize_records(&self, pool: &PointPool) -> Vec<u8> {
        let tubes = self.tubes.lock().unwrap();
        let mut out = Vec::new();
        for (normalized, tube) in tubes.iter().enumerate() {
            for (_, cell) in tube.iter() {
                if let Some(handle) = cell.handle() {
                    let (_, payload) = pool.get(handle);
                    write_record(&mut out, normalized as u64, &payload);
                }
            }
        }
        out
    }

    fn points_at(&self, pool: &PointPool, normalized: u64) -> Vec<(Point, Vec<u8>)> {
        let tubes = self.tubes.lock().unwrap();
        let tube = &tubes[normalized as usize];
        tube.iter()
            .filter_map(|(_, cell)| cell.handle().map(|handle| pool.get(handle)))
            .collect()
    }

    fn handles(&self) -> Vec<PointHandle> {
        let tubes = self.tubes.lock().unwrap();
        tubes
            .iter()
            .flat_map(|tube| tube.iter().filter_map(|(_, cell)| cell.handle()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_creation_only_once_per_cell() {
        let pool = PointPool::new(8);
        let chunk = ContiguousChunk::new(Id::from_u64(0), 4);
        let point = Point::new(1., 2., 3.);
        let payload = [0u8; 8];
        assert!(chunk.insert(&pool, 1, 0, point, &payload));
        assert!(!chunk.insert(&pool, 1, 0, point, &payload));
        assert_eq!(1, chunk.num_points());
    }

    #[test]
    fn serialize_emits_one_record_per_occupied_cell() {
        let pool = PointPool::new(8);
        let chunk = ContiguousChunk::new(Id::from_u64(0), 4);
        chunk.insert(&pool, 0, 0, Point::new(0., 0., 0.), &[1u8; 8]);
        chunk.insert(&pool, 2, 0, Point::new(1., 1., 1.), &[2u8; 8]);
        let records = chunk.serialize_records(&pool);
        assert_eq!(2 * (8 + 8), records.len());
    }

    #[test]
    fn points_at_only_returns_cells_for_that_normalized_id() {
        let pool = PointPool::new(8);
        let chunk = ContiguousChunk::new(Id::from_u64(0), 4);
        chunk.insert(&pool, 0, 0, Point::new(0., 0., 0.), &[1u8; 8]);
        chunk.insert(&pool, 2, 0, Point::new(1., 1., 1.), &[2u8; 8]);
        let at_zero = chunk.points_at(&pool, 0);
        assert_eq!(1, at_zero.len());
        assert_eq!(Point::new(0., 0., 0.), at_zero[0].0);
        assert!(chunk.points_at(&pool, 1).is_empty());
    }
}
