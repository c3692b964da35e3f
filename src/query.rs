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

use crate::chunk::{self, Chunk};
use crate::climber::Climber;
use crate::codec::Codec;
use crate::endpoint::Endpoint;
use crate::errors::*;
use crate::id::Id;
use crate::point::{BBox, Point};
use crate::pool::PointPool;
use crate::schema::Schema;
use crate::split_climber::SplitClimber;
use crate::structure::Structure;
use lru::LruCache;
use std::sync::{Arc, Mutex};

/// A range query over an existing tree: walks a `SplitClimber`, and for
/// every node it yields, loads the owning chunk (an LRU of recently-loaded
/// chunks avoids repeat GETs for chunks that span several visited nodes)
/// and collects the cells whose point lies in `bbox`. Mirrors the
/// teacher's `read_write::cache::Cache` wrapping a `LruCache` in front of
/// node loads.
pub struct Query {
    structure: Structure,
    schema: Schema,
    codec: Arc<dyn Codec>,
    endpoint: Arc<dyn Endpoint>,
    root_bbox: BBox,
    bbox: BBox,
    depth_begin: u32,
    depth_end: u32,
    pool: Arc<PointPool>,
    base_chunk_id: Id,
    chunk_cache: Mutex<LruCache<Id, Arc<dyn Chunk>>>,
}

impl Query {
    pub fn new(
        structure: Structure,
        schema: Schema,
        codec: Arc<dyn Codec>,
        endpoint: Arc<dyn Endpoint>,
        root_bbox: BBox,
        bbox: BBox,
        depth_begin: u32,
        depth_end: u32,
        cache_capacity: usize,
    ) -> Self {
        let point_size = schema.point_size();
        let base_chunk_id = Id::from_u64(structure.nominal_chunk_index());
        Query {
            structure,
            schema,
            codec,
            endpoint,
            root_bbox,
            bbox,
            depth_begin,
            depth_end,
            pool: Arc::new(PointPool::new(point_size)),
            base_chunk_id,
            chunk_cache: Mutex::new(LruCache::new(cache_capacity)),
        }
    }

    /// Runs the query to completion, returning every `(Point, payload)`
    /// pair in `bbox` found in nodes within `[depth_begin, depth_end)`.
    pub fn run(&self) -> Result<Vec<(Point, Vec<u8>)>> {
        let mut climber = SplitClimber::new(
            self.structure,
            self.root_bbox,
            self.bbox,
            self.depth_begin,
            self.depth_end,
        );
        let mut out = Vec::new();
        while climber.next(false) {
            let (chunk_id, max_points) = self.chunk_address(climber.path());
            let chunk = self.chunk(&chunk_id, max_points)?;
            let normalized = chunk.normalize(climber.index())?;
            self.collect_matches(chunk.as_ref(), normalized, &mut out);
        }
        Ok(out)
    }

    /// Replays `path` (the octant taken at each depth, root-first) through a
    /// fresh `Climber` to recover the id and capacity of the chunk that owns
    /// the node at the end of it, reusing `Climber::climb`'s regime-dependent
    /// bookkeeping rather than duplicating it.
    fn chunk_address(&self, path: &[u64]) -> (Id, u64) {
        let mut climber = Climber::new(self.structure, self.root_bbox);
        for &dir in path {
            climber.climb(dir);
        }
        (climber.chunk_id().clone(), climber.chunk_points())
    }

    fn chunk(&self, id: &Id, max_points: u64) -> Result<Arc<dyn Chunk>> {
        if let Some(chunk) = self.chunk_cache.lock().unwrap().get(id) {
            log::trace!("chunk {} served from cache", id);
            return Ok(Arc::clone(chunk));
        }
        let path = id.to_string();
        log::debug!("chunk {} missed cache, fetching", path);
        let bytes = self.endpoint.get(&path)?;
        // Only the base chunk spans multiple depths; every chunk past it is
        // entered fresh at one depth, where `Climber::tick` always yields 0.
        let tick_levels = if *id == self.base_chunk_id { None } else { Some(0) };
        let loaded: Arc<dyn Chunk> = Arc::from(chunk::load(
            &bytes,
            id.clone(),
            max_points,
            &self.schema,
            self.codec.as_ref(),
            &self.structure,
            self.root_bbox,
            tick_levels,
            &self.pool,
        )?);
        self.chunk_cache.lock().unwrap().put(id.clone(), Arc::clone(&loaded));
        Ok(loaded)
    }

    fn collect_matches(&self, chunk: &dyn Chunk, normalized: u64, out: &mut Vec<(Point, Vec<u8>)>) {
        for (point, payload) in chunk.points_at(&self.pool, normalized) {
            if self.bbox.contains(&point) {
                out.push((point, payload));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::chunk::ContiguousChunk;
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

    #[test]
    fn run_finds_a_point_stored_in_the_base_chunk() {
        let structure = Structure::new(3, 5, 5, 0, 256).unwrap();
        let schema = Schema::xyz();
        let root_bbox = BBox::new(Point::new(-1., -1., -1.), Point::new(1., 1., 1.));
        let pool = PointPool::new(schema.point_size());
        let chunk = ContiguousChunk::new(Id::from_u64(structure.nominal_chunk_index()), 256);
        // normalized == 0 is the node reached by always descending into the
        // lowest (dir == 0) octant; the root's own minimum corner always
        // resolves to that octant at every depth, since it never crosses a
        // midpoint.
        let corner = Point::new(-1., -1., -1.);
        chunk.insert(&pool, 0, 0, corner, &payload_of(&corner));

        let endpoint = MemEndpoint::new();
        let codec = PassthroughCodec;
        chunk::save(&chunk, &pool, &schema, &codec, &endpoint, None).unwrap();

        // A degenerate box at that same corner overlaps only the dir == 0
        // octant at every depth, forcing the traversal down the path the
        // point above was stored under, and matches it by containment too.
        let query_bbox = BBox::new(corner, corner);
        let query = Query::new(
            structure,
            schema,
            Arc::new(PassthroughCodec),
            Arc::new(endpoint),
            root_bbox,
            query_bbox,
            structure.nominal_chunk_depth(),
            structure.nominal_chunk_depth() + 1,
            16,
        );
        let results = query.run().unwrap();
        assert_eq!(1, results.len());
        assert_eq!(corner, results[0].0);
    }

    #[test]
    fn run_finds_nothing_outside_the_depth_window() {
        let structure = Structure::new(3, 5, 5, 0, 256).unwrap();
        let schema = Schema::xyz();
        let root_bbox = BBox::new(Point::new(-1., -1., -1.), Point::new(1., 1., 1.));
        let pool = PointPool::new(schema.point_size());
        let chunk = ContiguousChunk::new(Id::from_u64(structure.nominal_chunk_index()), 256);
        let endpoint = MemEndpoint::new();
        let codec = PassthroughCodec;
        // An empty base chunk, reachable but holding no points, so the
        // window genuinely comes up empty rather than erroring on a missing
        // chunk that was never saved.
        chunk::save(&chunk, &pool, &schema, &codec, &endpoint, None).unwrap();

        let query = Query::new(
            structure,
            schema,
            Arc::new(PassthroughCodec),
            Arc::new(endpoint),
            root_bbox,
            root_bbox,
            1,
            3,
            16,
        );
        assert!(query.run().unwrap().is_empty());
    }

    #[test]
    fn run_finds_a_point_stored_past_the_nominal_depth() {
        // cold_depth_begin and sparse_depth_begin both sit below
        // nominal_chunk_depth + 2, so a point inserted at that depth lands
        // in a sparse chunk reached only by mirroring `Climber::climb`'s
        // chunk-id arithmetic, not by the base chunk's id.
        let structure = Structure::new(3, 5, 5, 6, 256).unwrap();
        let schema = Schema::xyz();
        let root_bbox = BBox::new(Point::new(-1., -1., -1.), Point::new(1., 1., 1.));
        let endpoint = Arc::new(MemEndpoint::new());
        let codec: Arc<dyn Codec> = Arc::new(PassthroughCodec);

        let builder = Builder::new(
            structure,
            schema.clone(),
            Arc::clone(&codec),
            Arc::clone(&endpoint),
            root_bbox,
        );
        // The root's minimum corner always resolves to octant 0 at every
        // depth, so both the builder's point-following climber and the
        // query's degenerate-bbox traversal walk the identical path down to
        // it, landing on the same chunk id.
        let corner = Point::new(-1., -1., -1.);
        let target_depth = structure.nominal_chunk_depth() + 2;
        builder
            .insert_point_to_depth(corner, &payload_of(&corner), target_depth)
            .unwrap();
        builder.finish().unwrap();

        let query_bbox = BBox::new(corner, corner);
        let query = Query::new(
            structure,
            schema,
            codec,
            endpoint,
            root_bbox,
            query_bbox,
            target_depth,
            target_depth + 1,
            16,
        );
        let results = query.run().unwrap();
        assert_eq!(1, results.len());
        assert_eq!(corner, results[0].0);
    }
}
