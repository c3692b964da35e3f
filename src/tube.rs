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

use crate::point::{BBox, Point};
use crate::pool::PointHandle;

/// One point payload plus its spatial coordinates. Either holds a valid
/// arena handle or is the sentinel non-point - never anything in between.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    point: Point,
    handle: Option<PointHandle>,
}

impl Cell {
    pub fn empty() -> Self {
        Cell {
            point: Point::non_existent(),
            handle: None,
        }
    }

    pub fn occupied(point: Point, handle: PointHandle) -> Self {
        Cell {
            point,
            handle: Some(handle),
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.handle.is_some()
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    pub fn handle(&self) -> Option<PointHandle> {
        self.handle
    }

    pub fn set(&mut self, point: Point, handle: PointHandle) {
        self.point = point;
        self.handle = Some(handle);
    }
}

/// The collection of cells sharing one XY (or X, in 2D) lineage,
/// disambiguated by an integer z-bin ("tick"). Implemented as a small
/// sorted `Vec` rather than a hash map: real tubes hold a handful of
/// entries at most, so linear scan beats hashing overhead.
#[derive(Debug, Clone, Default)]
pub struct Tube {
    cells: Vec<(u64, Cell)>,
}

impl Tube {
    pub fn new() -> Self {
        Tube { cells: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Deterministically maps `point`'s z-coordinate (ignored in 2D callers,
    /// since z is never populated) into `[0, 2^levels)`, relative to
    /// `chunk_bbox`'s z extent.
    pub fn calc_tick(point: &Point, chunk_bbox: &BBox, levels: u32) -> u64 {
        if levels == 0 {
            return 0;
        }
        let bins = 1u64 << levels;
        let min_z = chunk_bbox.min().z;
        let max_z = chunk_bbox.max().z;
        let span = max_z - min_z;
        if span <= 0.0 || !span.is_finite() {
            return 0;
        }
        let fraction = ((point.z - min_z) / span).max(0.0).min(1.0 - f64::EPSILON);
        (fraction * bins as f64) as u64
    }

    /// Inserts a cell at `tick`, overwriting whatever was there.
    pub fn add_cell(&mut self, tick: u64, cell: Cell) {
        match self.cells.binary_search_by_key(&tick, |&(t, _)| t) {
            Ok(pos) => self.cells[pos].1 = cell,
            Err(pos) => self.cells.insert(pos, (tick, cell)),
        }
    }

    /// Returns the existing cell at `tick`, or inserts and returns a fresh
    /// empty one. The `bool` tells the caller whether a new cell was
    /// created, so `Chunk::get_cell` knows whether to bump `num_points`.
    pub fn get_cell(&mut self, tick: u64) -> (bool, &mut Cell) {
        let pos = match self.cells.binary_search_by_key(&tick, |&(t, _)| t) {
            Ok(pos) => (false, pos),
            Err(pos) => {
                self.cells.insert(pos, (tick, Cell::empty()));
                (true, pos)
            }
        };
        (pos.0, &mut self.cells[pos.1].1)
    }

    /// Iterates cells in ascending tick order, the order the chunk tail
    /// serializes them in.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Cell)> {
        self.cells.iter().map(|&(tick, ref cell)| (tick, cell))
    }
}
