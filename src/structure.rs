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

/// Pure value object describing the geometry of a tree: how many dimensions
/// it branches over, how deep a chunk's nominal region reaches, and where
/// the cold and sparse chunking regimes begin. Every derived value (the
/// branching factor, the nominal chunk index, the id at which cold chunks
/// begin) is computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    dimensions: u32,
    factor: u64,
    nominal_chunk_depth: u32,
    cold_depth_begin: u32,
    sparse_depth_begin: u32,
    base_chunk_points: u64,
    nominal_chunk_index: u64,
    cold_index_begin: u64,
}

impl Structure {
    pub fn new(
        dimensions: u32,
        nominal_chunk_depth: u32,
        cold_depth_begin: u32,
        sparse_depth_begin: u32,
        base_chunk_points: u64,
    ) -> Result<Self> {
        if dimensions != 2 && dimensions != 3 {
            return Err(ErrorKind::InvalidStructure(format!(
                "dimensions must be 2 or 3, got {}",
                dimensions
            ))
            .into());
        }
        if cold_depth_begin < nominal_chunk_depth {
            return Err(ErrorKind::InvalidStructure(
                "cold_depth_begin must be >= nominal_chunk_depth".to_string(),
            )
            .into());
        }
        if sparse_depth_begin != 0 && sparse_depth_begin <= cold_depth_begin {
            return Err(ErrorKind::InvalidStructure(
                "sparse_depth_begin must be > cold_depth_begin when enabled".to_string(),
            )
            .into());
        }

        let factor = 1u64 << dimensions;
        let nominal_chunk_index = offset_at_depth(factor, nominal_chunk_depth);
        let cold_index_begin = offset_at_depth(factor, cold_depth_begin);

        Ok(Structure {
            dimensions,
            factor,
            nominal_chunk_depth,
            cold_depth_begin,
            sparse_depth_begin,
            base_chunk_points,
            nominal_chunk_index,
            cold_index_begin,
        })
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn factor(&self) -> u64 {
        self.factor
    }

    pub fn nominal_chunk_depth(&self) -> u32 {
        self.nominal_chunk_depth
    }

    pub fn cold_depth_begin(&self) -> u32 {
        self.cold_depth_begin
    }

    pub fn sparse_depth_begin(&self) -> u32 {
        self.sparse_depth_begin
    }

    pub fn dynamic_chunking_enabled(&self) -> bool {
        self.sparse_depth_begin != 0
    }

    pub fn base_chunk_points(&self) -> u64 {
        self.base_chunk_points
    }

    pub fn nominal_chunk_index(&self) -> u64 {
        self.nominal_chunk_index
    }

    pub fn cold_index_begin(&self) -> u64 {
        self.cold_index_begin
    }

    /// The depth at which the node with the given id lives, derived from the
    /// geometric-sum offset baked into every index. Used when a base chunk
    /// (which spans multiple depths) needs a per-point depth on load.
    pub fn depth_of(&self, id: &Id) -> u32 {
        let mut depth = 0u32;
        let mut offset = Id::from_u64(0);
        loop {
            let next_offset = offset.shl(self.dimensions).add_u64(1);
            if next_offset > *id {
                return depth;
            }
            offset = next_offset;
            depth += 1;
        }
    }
}

/// `(factor^depth - 1) / (factor - 1)`, the id of the first node at `depth`,
/// computed without floating point by repeated multiply-and-add (`factor`
/// is always a small power of two, so `depth` never needs to be large for
/// this to terminate quickly).
fn offset_at_depth(factor: u64, depth: u32) -> u64 {
    let mut offset = 0u64;
    for _ in 0..depth {
        offset = offset * factor + 1;
    }
    offset
}
