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

use crate::id::Id;
use crate::point::{BBox, Point};
use crate::structure::Structure;

/// Depth-first preorder traversal over only those subtrees overlapping a
/// query region, within a half-open depth window `[depth_begin, depth_end)`.
///
/// `traversal` holds one octant code per depth below the root; unlike
/// `Climber`, which only ever moves forward, a range query must backtrack
/// to sibling subtrees, so position tracking is recomputed from the whole
/// stack on each move rather than carried incrementally - the stack is
/// never more than a few dozen entries deep, so this is cheap.
pub struct SplitClimber {
    structure: Structure,
    root_bbox: BBox,
    query: BBox,
    depth_begin: u32,
    depth_end: u32,
    traversal: Vec<u64>,
    index: Id,
    splits: u64,
}

impl SplitClimber {
    pub fn new(structure: Structure, root_bbox: BBox, query: BBox, depth_begin: u32, depth_end: u32) -> Self {
        SplitClimber {
            structure,
            root_bbox,
            query,
            depth_begin,
            depth_end,
            traversal: Vec::new(),
            index: Id::zero(),
            splits: 1,
        }
    }

    pub fn depth(&self) -> u32 {
        self.traversal.len() as u32
    }

    pub fn index(&self) -> &Id {
        &self.index
    }

    /// The octant code taken at each depth to reach the node `next` most
    /// recently returned `true` for, root-first. Lets a caller replay the
    /// same path through a `Climber` to recover that node's owning chunk
    /// id and capacity, since this traversal (unlike `Climber`) never
    /// carries chunk bookkeeping incrementally.
    pub fn path(&self) -> &[u64] {
        &self.traversal
    }

    /// The bounding box of the node `next` most recently returned `true`
    /// for.
    pub fn bbox(&self) -> BBox {
        self.node_bbox()
    }

    fn positions(&self) -> (u64, u64, u64) {
        let dims = self.structure.dimensions();
        let mut x = 0u64;
        let mut y = 0u64;
        let mut z = 0u64;
        for &dir in &self.traversal {
            x = (x << 1) | (dir & 1);
            y = (y << 1) | ((dir >> 1) & 1);
            z = (z << 1) | if dims == 3 { (dir >> 2) & 1 } else { 0 };
        }
        (x, y, z)
    }

    fn node_bbox(&self) -> BBox {
        let (x, y, z) = self.positions();
        let splits = self.splits as f64;
        let min = self.root_bbox.min();
        let max = self.root_bbox.max();
        let ext_x = (max.x - min.x) / splits;
        let ext_y = (max.y - min.y) / splits;

        let (min_z, max_z) = if self.structure.dimensions() == 3 {
            let ext_z = (max.z - min.z) / splits;
            (min.z + z as f64 * ext_z, min.z + (z + 1) as f64 * ext_z)
        } else {
            (min.z, max.z)
        };

        BBox::new(
            Point::new(min.x + x as f64 * ext_x, min.y + y as f64 * ext_y, min_z),
            Point::new(min.x + (x + 1) as f64 * ext_x, min.y + (y + 1) as f64 * ext_y, max_z),
        )
    }

    fn recompute_index(&mut self) {
        let dims = self.structure.dimensions();
        let mut id = Id::zero();
        for &dir in &self.traversal {
            id = id.shl(dims).add_u64(1 + dir);
        }
        self.index = id;
        self.splits = 1u64 << self.traversal.len();
    }

    /// Advances the traversal to the next node in `[depth_begin, depth_end)`
    /// overlapping the query region, or returns `false` once the whole
    /// window has been exhausted. `terminate` tells the traversal to skip
    /// past the current subtree rather than descend into it (used
    /// internally when a subtree's bbox misses the query, and exposed so a
    /// caller that already knows a subtree is irrelevant can prune it
    /// directly).
    pub fn next(&mut self, mut terminate: bool) -> bool {
        let factor = self.structure.factor();
        loop {
            let leaf_of_window = self.depth() + 1 == self.depth_end;
            if terminate || leaf_of_window {
                loop {
                    match self.traversal.last().copied() {
                        Some(top) if top + 1 == factor => {
                            self.traversal.pop();
                        }
                        _ => break,
                    }
                }
                if self.traversal.is_empty() {
                    return false;
                }
                *self.traversal.last_mut().unwrap() += 1;
            } else {
                self.traversal.push(0);
            }
            self.recompute_index();

            let depth = self.depth();
            if depth == 0 {
                return false;
            }
            if depth < self.depth_begin {
                terminate = false;
                continue;
            }
            if self.node_bbox().overlaps(&self.query) {
                return true;
            }
            terminate = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure() -> Structure {
        Structure::new(3, 10, 10, 0, 256).unwrap()
    }

    fn root_bbox() -> BBox {
        BBox::new(Point::new(0., 0., 0.), Point::new(8., 8., 8.))
    }

    #[test]
    fn unconstrained_query_visits_every_node_in_the_window() {
        let s = structure();
        let query = root_bbox();
        let mut climber = SplitClimber::new(s, root_bbox(), query, 1, 3);
        let mut count = 0;
        while climber.next(false) {
            count += 1;
        }
        let factor = s.factor();
        assert_eq!(factor + factor * factor, count);
    }

    #[test]
    fn query_touching_one_root_octant_prunes_the_rest() {
        let s = structure();
        let root = root_bbox();
        // Exactly the low-x/low-y/low-z octant of the root (dir = 0).
        let query = root.octant(0, 3);
        let mut climber = SplitClimber::new(s, root, query, 2, 4);
        let mut count = 0;
        while climber.next(false) {
            count += 1;
        }
        let factor = s.factor();
        assert_eq!(factor + factor * factor, count);
    }

    #[test]
    fn disjoint_query_visits_nothing() {
        let s = structure();
        let root = root_bbox();
        let query = BBox::new(Point::new(100., 100., 100.), Point::new(101., 101., 101.));
        let mut climber = SplitClimber::new(s, root, query, 1, 3);
        assert!(!climber.next(false));
    }

    #[test]
    fn every_returned_node_lies_within_the_depth_window() {
        let s = structure();
        let query = root_bbox();
        let mut climber = SplitClimber::new(s, root_bbox(), query, 2, 4);
        while climber.next(false) {
            assert!(climber.depth() >= 2 && climber.depth() < 4);
        }
    }
}
