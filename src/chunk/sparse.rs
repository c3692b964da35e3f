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
use fnv::FnvHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A sparse, map-backed range of tubes, populated only for node-ids that
/// actually hold points. Used from `sparse_depth_begin` on, where the
/// overwhelming majority of a contiguous range's ids would otherwise sit
/// empty.
pub struct SparseChunk {
    id: Id,
    max_points: u64,
    num_points: AtomicU64,
    tubes: Mutex<FnvHashMap<u64, Tube>>,
}

impl SparseChunk {
    pub fn new(id: Id, max_points: u64) -> Self {
        counters::chunk_created(0);
        SparseChunk {
            id,
            max_points,
            num_points: AtomicU64::new(0),
            tubes: Mutex::new(FnvHashMap::default()),
        }
    }
}

impl Drop for SparseChunk {
    fn drop(&mut self) {
        counters::chunk_dropped();
    }
}

impl Chunk for SparseChunk {
    fn id(&self) -> &Id {
        &self.id
    }

    fn num_points(&self) -> u64 {
        self.num_points.load(Ordering::Acquire)
    }

    fn chunk_type(&self) -> ChunkType {
        ChunkType::Sparse
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
        let tube = tubes.entry(normalized).or_insert_with(Tube::new);
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
        let mut normalized_ids: Vec<&u64> = tubes.keys().collect();
        normalized_ids.sort_unstable();

        let mut out = Vec::new();
        for &normalized in normalized_ids {
            let tube = &tubes[&normalized];
            for (_, cell) in tube.iter() {
                if let Some(handle) = cell.handle() {
                    let (_, payload) = pool.get(handle);
                    write_record(&mut out, normalized, &payload);
                }
            }
        }
        out
    }

    fn points_at(&self, pool: &PointPool, normalized: u64) -> Vec<(Point, Vec<u8>)> {
        let tubes = self.tubes.lock().unwrap();
        match tubes.get(&normalized) {
            Some(tube) => tube
                .iter()
                .filter_map(|(_, cell)| cell.handle().map(|handle| pool.get(handle)))
                .collect(),
            None => Vec::new(),
        }
    }

    fn handles(&self) -> Vec<PointHandle> {
        let tubes = self.tubes.lock().unwrap();
        tubes
            .values()
            .flat_map(|tube| tube.iter().filter_map(|(_, cell)| cell.handle()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryInto;

    #[test]
    fn insert_only_allocates_tubes_that_are_touched() {
        let pool = PointPool::new(8);
        let chunk = SparseChunk::new(Id::from_u64(0), 1_000_000);
        chunk.insert(&pool, 999_999, 0, Point::new(1., 1., 1.), &[0u8; 8]);
        assert_eq!(1, chunk.tubes.lock().unwrap().len());
        assert_eq!(1, chunk.num_points());
    }

    #[test]
    fn serialize_orders_records_by_normalized_id() {
        let pool = PointPool::new(8);
        let chunk = SparseChunk::new(Id::from_u64(0), 1_000);
        chunk.insert(&pool, 500, 0, Point::new(1., 1., 1.), &[9u8; 8]);
        chunk.insert(&pool, 10, 0, Point::new(0., 0., 0.), &[1u8; 8]);
        let records = chunk.serialize_records(&pool);
        assert_eq!(2 * (8 + 8), records.len());
        let first_normalized = u64::from_le_bytes(records[0..8].try_into().unwrap());
        assert_eq!(10, first_normalized);
    }

    #[test]
    fn points_at_returns_empty_for_an_untouched_id() {
        let pool = PointPool::new(8);
        let chunk = SparseChunk::new(Id::from_u64(0), 1_000);
        chunk.insert(&pool, 500, 0, Point::new(1., 1., 1.), &[9u8; 8]);
        assert_eq!(1, chunk.points_at(&pool, 500).len());
        assert!(chunk.points_at(&pool, 501).is_empty());
    }
}
