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

use crate::errors::*;
use crate::id::Id;
use crate::point::{BBox, Point};
use crate::structure::Structure;
use crate::tube::Tube;

/// A stateful cursor that descends a tree one octant (or quadrant) at a
/// time, tracking the node id, the chunk that owns it, and the depth. Reused
/// across points on the write path (`magnify` resets nothing - callers that
/// need a fresh descent per point construct a new `Climber`).
#[derive(Debug, Clone)]
pub struct Climber {
    structure: Structure,
    index: Id,
    level_index: Id,
    chunk_id: Id,
    chunk_num: u64,
    depth: u32,
    chunk_points: u64,
    depth_chunks: u64,
    bbox: BBox,
    chunk_bbox: BBox,
    chunk_base_depth: u32,
    last_point: Option<Point>,
}

impl Climber {
    pub fn new(structure: Structure, root_bbox: BBox) -> Self {
        Climber {
            structure,
            index: Id::zero(),
            level_index: Id::zero(),
            chunk_id: Id::from_u64(structure.nominal_chunk_index()),
            chunk_num: 0,
            depth: 0,
            chunk_points: structure.base_chunk_points(),
            depth_chunks: 1,
            bbox: root_bbox,
            chunk_bbox: root_bbox,
            chunk_base_depth: 0,
            last_point: None,
        }
    }

    pub fn index(&self) -> &Id {
        &self.index
    }

    pub fn level_index(&self) -> &Id {
        &self.level_index
    }

    pub fn chunk_id(&self) -> &Id {
        &self.chunk_id
    }

    pub fn chunk_num(&self) -> u64 {
        self.chunk_num
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn chunk_points(&self) -> u64 {
        self.chunk_points
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    /// The tick of the point most recently passed to `magnify`, within the
    /// tube it currently addresses.
    pub fn tick(&self) -> u64 {
        let point = match self.last_point {
            Some(p) => p,
            None => return 0,
        };
        let levels = self.depth.saturating_sub(self.chunk_base_depth);
        Tube::calc_tick(&point, &self.chunk_bbox, levels)
    }

    /// Descends one level towards `point`: computes the octant of `point`
    /// relative to the current bbox's midpoint and climbs into it. Fails
    /// with `Error::OutOfBounds` if `point` does not lie in the current
    /// bbox.
    pub fn magnify(&mut self, point: &Point) -> Result<()> {
        let dir = self.bbox.octant_of(point, self.structure.dimensions())?;
        self.bbox = self.bbox.octant(dir, self.structure.dimensions());
        self.last_point = Some(*point);
        self.climb(dir);
        Ok(())
    }

    /// Advances the climber's bookkeeping for having moved into octant
    /// `dir`. Split out from `magnify` so `SplitClimber` (which walks every
    /// octant of a subtree rather than one point's path) can drive the same
    /// id/chunk arithmetic.
    pub fn climb(&mut self, dir: u64) {
        let dims = self.structure.dimensions();
        self.depth += 1;
        self.index = self.index.shl(dims).add_u64(1 + dir);
        self.level_index = self.level_index.shl(dims).add_u64(1);

        if self.depth > self.structure.nominal_chunk_depth() {
            let factor = self.structure.factor();
            let use_sparse = self.structure.dynamic_chunking_enabled()
                && self.depth >= self.structure.sparse_depth_begin();
            if !use_sparse {
                let span = self.chunk_points / factor;
                let chunk_ratio = self.index.sub(&self.chunk_id).simple() / span;
                assert!(
                    chunk_ratio < factor,
                    "chunk_ratio {} exceeded factor {}",
                    chunk_ratio,
                    factor
                );
                self.chunk_id = self
                    .chunk_id
                    .shl(dims)
                    .add_u64(1 + chunk_ratio * self.chunk_points);
                if self.depth >= self.structure.cold_depth_begin() {
                    self.chunk_num = self
                        .chunk_id
                        .sub_u64(self.structure.cold_index_begin())
                        .simple()
                        / self.chunk_points;
                }
                self.depth_chunks *= factor;
            } else {
                self.chunk_num += self.depth_chunks;
                self.chunk_id = self.chunk_id.shl(dims).add_u64(1);
                self.chunk_points *= factor;
            }
            self.chunk_bbox = self.bbox;
            self.chunk_base_depth = self.depth;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure() -> Structure {
        Structure::new(3, 5, 5, 0, 256).unwrap()
    }

    fn root_bbox() -> BBox {
        BBox::new(Point::new(-1., -1., -1.), Point::new(1., 1., 1.))
    }

    #[test]
    fn octant_determinism() {
        let s = structure();
        let root = root_bbox();
        let p = Point::new(0.3, -0.6, 0.8);
        let mut climber = Climber::new(s, root);
        for _ in 0..4 {
            climber.magnify(&p).unwrap();
        }
        assert_eq!(4, climber.depth());
        assert!(climber.bbox().contains(&p));
    }

    #[test]
    fn out_of_bounds_point_fails() {
        let s = structure();
        let mut climber = Climber::new(s, root_bbox());
        let outside = Point::new(5., 5., 5.);
        assert!(climber.magnify(&outside).is_err());
    }

    #[test]
    fn index_composition_matches_geometric_sum() {
        let s = structure();
        let root = root_bbox();
        let mut climber = Climber::new(s, root);
        let dirs = [3u64, 1, 0];
        for &dir in &dirs {
            climber.climb(dir);
        }
        let factor = s.factor();
        let mut expected = 0u64;
        let mut offset = 0u64;
        for (k, &dir) in dirs.iter().rev().enumerate() {
            expected += dir * factor.pow(k as u32);
            offset += factor.pow(k as u32);
        }
        assert_eq!(expected + offset, climber.index().simple());
    }

    #[test]
    fn chunk_id_stays_at_nominal_index_until_past_nominal_depth() {
        let s = structure();
        let mut climber = Climber::new(s, root_bbox());
        for dir in 0..5u64 {
            climber.climb(dir % s.factor());
        }
        assert_eq!(s.nominal_chunk_index(), climber.chunk_id().simple());
    }

    #[test]
    fn sparse_boundary_grows_chunk_points_by_exact_factor() {
        // chunk_points is untouched by every climb below the sparse
        // threshold (only chunk_id/depth_chunks move); it grows by exactly
        // one factor multiplication per depth spent at or past the
        // threshold. With nominal_chunk_depth one below sparse_depth_begin,
        // reaching depth 10 performs exactly one such multiplication.
        let s = Structure::new(3, 9, 9, 10, 256).unwrap();
        let mut climber = Climber::new(s, root_bbox());
        for depth in 1..=10u64 {
            climber.climb(depth % s.factor());
        }
        let expected = s.base_chunk_points() * s.factor();
        assert_eq!(expected, climber.chunk_points());
    }
}
