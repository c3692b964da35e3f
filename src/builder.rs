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

use crate::chunk::{self, Chunk, ContiguousChunk, SparseChunk};
use crate::climber::Climber;
use crate::codec::Codec;
use crate::counters;
use crate::endpoint::Endpoint;
use crate::errors::*;
use crate::id::Id;
use crate::point::{BBox, Point};
use crate::pool::PointPool;
use crate::schema::Schema;
use crate::structure::Structure;
use fnv::FnvHashMap;
use scoped_pool::Pool;
use std::sync::{Arc, Mutex};

/// Drives a bulk insertion: descends a fresh `Climber` per point to a
/// target depth, locates (or lazily creates) the owning chunk, and leaves
/// resident chunks for the caller to evict or flush with `finish`. Mirrors
/// the teacher's `octree::generation` module's use of `scoped_pool` for
/// fanning work across worker threads, generalized from "one octree file
/// tree per worker" to "insert into a shared chunk table behind one lock".
pub struct Builder {
    structure: Structure,
    schema: Schema,
    codec: Arc<dyn Codec>,
    endpoint: Arc<dyn Endpoint>,
    pool: Arc<PointPool>,
    root_bbox: BBox,
    chunks: Mutex<FnvHashMap<Id, Arc<dyn Chunk>>>,
    worker_pool: Pool,
}

impl Builder {
    pub fn new(
        structure: Structure,
        schema: Schema,
        codec: Arc<dyn Codec>,
        endpoint: Arc<dyn Endpoint>,
        root_bbox: BBox,
    ) -> Self {
        let point_size = schema.point_size();
        Builder {
            structure,
            schema,
            codec,
            endpoint,
            pool: Arc::new(PointPool::new(point_size)),
            root_bbox,
            chunks: Mutex::new(FnvHashMap::default()),
            worker_pool: Pool::new(num_cpus::get()),
        }
    }

    pub fn pool(&self) -> &PointPool {
        &self.pool
    }

    /// Inserts one point at the default target depth (the nominal chunk
    /// depth - every point lands in the base chunk until the caller opts
    /// into deeper placement via `insert_point_to_depth`).
    pub fn insert_point(&self, point: Point, payload: &[u8]) -> Result<()> {
        self.insert_point_to_depth(point, payload, self.structure.nominal_chunk_depth())
    }

    pub fn insert_point_to_depth(&self, point: Point, payload: &[u8], target_depth: u32) -> Result<()> {
        let mut climber = Climber::new(self.structure, self.root_bbox);
        for _ in 0..target_depth {
            climber.magnify(&point)?;
        }
        let chunk_id = climber.chunk_id().clone();
        let max_points = climber.chunk_points();
        let use_sparse = self.structure.dynamic_chunking_enabled()
            && climber.depth() >= self.structure.sparse_depth_begin();
        let chunk = self.chunk_for(chunk_id, max_points, use_sparse);
        let normalized = chunk.normalize(climber.index())?;
        chunk.insert(&self.pool, normalized, climber.tick(), point, payload);
        Ok(())
    }

    fn chunk_for(&self, id: Id, max_points: u64, use_sparse: bool) -> Arc<dyn Chunk> {
        let mut chunks = self.chunks.lock().unwrap();
        Arc::clone(chunks.entry(id.clone()).or_insert_with(|| {
            log::debug!("creating {} chunk {} (max_points {})", if use_sparse { "sparse" } else { "contiguous" }, id, max_points);
            let chunk: Arc<dyn Chunk> = if use_sparse {
                Arc::new(SparseChunk::new(id, max_points))
            } else {
                Arc::new(ContiguousChunk::new(id, max_points))
            };
            chunk
        }))
    }

    /// Drives `points`, split across `worker_count` disjoint iterators
    /// (the caller is responsible for assigning disjoint spatial regions
    /// so contiguous-chunk access stays non-overlapping per thread), onto
    /// the worker pool.
    pub fn insert_all<I>(&self, partitions: Vec<I>) -> Result<()>
    where
        I: Iterator<Item = (Point, Vec<u8>)> + Send,
    {
        let results: Vec<Mutex<Result<()>>> = partitions.iter().map(|_| Mutex::new(Ok(()))).collect();
        self.worker_pool.scoped(|scope| {
            for (partition, result) in partitions.into_iter().zip(results.iter()) {
                scope.execute(move || {
                    for (point, payload) in partition {
                        if let Err(err) = self.insert_point(point, &payload) {
                            *result.lock().unwrap() = Err(err);
                            return;
                        }
                    }
                });
            }
        });
        for result in results {
            result.into_inner().unwrap()?;
        }
        Ok(())
    }

    /// Serializes and PUTs the chunk at `id`, then drops it from the
    /// resident table - the caller's signal that its subtree is closed.
    pub fn evict(&self, id: &Id) -> Result<()> {
        let chunk = self.chunks.lock().unwrap().remove(id);
        if let Some(chunk) = chunk {
            log::debug!("evicting chunk {} ({} points)", id, chunk.num_points());
            chunk::save(
                chunk.as_ref(),
                &self.pool,
                &self.schema,
                self.codec.as_ref(),
                self.endpoint.as_ref(),
                None,
            )?;
            self.pool.release(&chunk.handles());
            counters::sub_points(chunk.num_points() as usize, self.schema.point_size());
        }
        Ok(())
    }

    /// Flushes every chunk still resident. Call once all points have been
    /// inserted.
    pub fn finish(&self) -> Result<()> {
        let ids: Vec<Id> = self.chunks.lock().unwrap().keys().cloned().collect();
        log::info!("flushing {} resident chunks", ids.len());
        for id in ids {
            self.evict(&id)?;
        }
        Ok(())
    }

    pub fn resident_chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PassthroughCodec;
    use crate::endpoint::MemEndpoint;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn payload_of(point: &Point) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24);
        bytes.write_f64::<LittleEndian>(point.x).unwrap();
        bytes.write_f64::<LittleEndian>(point.y).unwrap();
        bytes.write_f64::<LittleEndian>(point.z).unwrap();
        bytes
    }

    fn builder() -> Builder {
        let structure = Structure::new(3, 5, 5, 0, 256).unwrap();
        let schema = Schema::xyz();
        let root_bbox = BBox::new(Point::new(-1., -1., -1.), Point::new(1., 1., 1.));
        Builder::new(
            structure,
            schema,
            Arc::new(PassthroughCodec),
            Arc::new(MemEndpoint::new()),
            root_bbox,
        )
    }

    #[test]
    fn insert_then_finish_saves_every_resident_chunk() {
        let builder = builder();
        let point = Point::new(0.1, 0.2, 0.3);
        builder.insert_point(point, &payload_of(&point)).unwrap();
        assert_eq!(1, builder.resident_chunk_count());
        builder.finish().unwrap();
        assert_eq!(0, builder.resident_chunk_count());
    }

    #[test]
    fn insert_all_drives_disjoint_partitions_concurrently() {
        let builder = builder();
        let partitions: Vec<_> = (0..4)
            .map(|i| {
                let x = -0.5 + i as f64 * 0.1;
                vec![(Point::new(x, 0., 0.), payload_of(&Point::new(x, 0., 0.)))].into_iter()
            })
            .collect();
        builder.insert_all(partitions).unwrap();
        builder.finish().unwrap();
    }

    #[test]
    fn insert_out_of_bounds_point_fails() {
        let builder = builder();
        let outside = Point::new(5., 5., 5.);
        assert!(builder.insert_point(outside, &payload_of(&outside)).is_err());
    }
}
