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

mod contiguous;
mod sparse;
mod tail;

pub use contiguous::ContiguousChunk;
pub use sparse::SparseChunk;
pub use tail::ChunkType;

use crate::codec::Codec;
use crate::endpoint::Endpoint;
use crate::errors::*;
use crate::id::Id;
use crate::point::{BBox, Point};
use crate::pool::{PointHandle, PointPool};
use crate::schema::Schema;
use crate::structure::Structure;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// The storage unit of the tree: a fixed range of node ids grouped
/// together. `ContiguousChunk` backs the dense, array-indexed regime;
/// `SparseChunk` backs the map-indexed one past the sparse-depth
/// threshold. Both variants share this contract so `Builder` and `Query`
/// never need to know which one they are holding.
pub trait Chunk: Send + Sync {
    fn id(&self) -> &Id;

    fn num_points(&self) -> u64;

    fn chunk_type(&self) -> ChunkType;

    /// `(raw_id - id).simple()`; callers must have already checked `raw_id`
    /// falls in `[id, id + max_points)` via `normalize`'s `Err` path.
    fn normalize(&self, raw_id: &Id) -> Result<u64>;

    /// Acquires (creating if absent) the cell at `(normalized, tick)` and
    /// stores `point`/`payload` there, copying `payload` into `pool`.
    /// Returns whether the cell was newly created, so the caller can bump
    /// `num_points` and the process-wide memory counter exactly once.
    fn insert(&self, pool: &PointPool, normalized: u64, tick: u64, point: Point, payload: &[u8]) -> bool;

    /// Emits one celled-schema record (an 8-byte `TubeId` followed by the
    /// native payload bytes) per occupied cell, in ascending normalized-id,
    /// ascending-tick order.
    fn serialize_records(&self, pool: &PointPool) -> Vec<u8>;

    /// Every occupied cell's point and payload at `normalized`, across all
    /// ticks. A range query addresses one node (and so one normalized id)
    /// at a time, rather than dumping a whole chunk via `serialize_records`.
    fn points_at(&self, pool: &PointPool, normalized: u64) -> Vec<(Point, Vec<u8>)>;

    /// Every occupied cell's pool handle, in no particular order. Used to
    /// release a chunk's point storage back to the pool once it has been
    /// saved and is about to be dropped.
    fn handles(&self) -> Vec<PointHandle>;
}

/// Serializes `chunk`'s occupied cells, compresses them against `schema`'s
/// celled form, appends the tail, and PUTs under `chunk.id()` (optionally
/// suffixed, for a contiguous base chunk sharing an id range with others).
pub fn save(
    chunk: &dyn Chunk,
    pool: &PointPool,
    schema: &Schema,
    codec: &dyn Codec,
    endpoint: &dyn Endpoint,
    postfix: Option<&str>,
) -> Result<()> {
    let celled = schema.celled();
    let records = chunk.serialize_records(pool);
    let compressed = codec.compress(&records, &celled)?;

    let mut blob = compressed;
    tail::write_tail(&mut blob, chunk.num_points(), chunk.chunk_type());

    let path = match postfix {
        Some(postfix) => format!("{}{}", chunk.id(), postfix),
        None => chunk.id().to_string(),
    };
    log::debug!("saving chunk {} ({} bytes, {} points)", path, blob.len(), chunk.num_points());
    endpoint.put(&path, &blob)
}

/// Loads and reconstructs a chunk from its serialized form. `tick_levels`
/// is the fixed tick-bit count every point in this chunk is addressed
/// with: `None` only for a contiguous base chunk, whose points span
/// multiple depths and whose chunk bbox is the root bbox, so the
/// per-point absolute depth (equal to its tick-level count, since the
/// base chunk's own depth offset is zero) must instead be derived per
/// point from `structure.depth_of`. Every other chunk passes a fixed
/// `Some(levels)`, since its points all share one depth and one
/// chunk-local bbox - `Some(0)` is the common case past the nominal
/// depth, where `Climber::tick` always yields zero.
pub fn load(
    bytes: &[u8],
    id: Id,
    max_points: u64,
    schema: &Schema,
    codec: &dyn Codec,
    structure: &Structure,
    chunk_bbox: BBox,
    tick_levels: Option<u32>,
    pool: &PointPool,
) -> Result<Box<dyn Chunk>> {
    let (payload, num_points, chunk_type) = tail::read_tail(bytes)?;
    log::debug!("loading chunk {} ({:?}, {} points)", id, chunk_type, num_points);
    let celled = schema.celled();
    let expected_size = num_points as usize * celled.point_size();
    let records = codec.decompress(payload, &celled, expected_size)?;

    let chunk: Box<dyn Chunk> = match chunk_type {
        ChunkType::Sparse => Box::new(SparseChunk::new(id, max_points)),
        ChunkType::Contiguous => Box::new(ContiguousChunk::new(id, max_points)),
    };

    let celled_point_size = celled.point_size();
    let native_point_size = schema.point_size();
    for record in records.chunks_exact(celled_point_size) {
        let mut cursor = record;
        let normalized = cursor.read_u64::<LittleEndian>()?;
        let payload = &record[8..8 + native_point_size];
        let point = decode_xyz(payload)?;

        let levels = match tick_levels {
            Some(levels) => levels,
            None => structure.depth_of(&id.add_u64(normalized)),
        };
        let tick = crate::tube::Tube::calc_tick(&point, &chunk_bbox, levels);
        chunk.insert(pool, normalized, tick, point, payload);
    }
    Ok(chunk)
}

fn decode_xyz(payload: &[u8]) -> Result<Point> {
    if payload.len() < 24 {
        return Err(ErrorKind::MalformedBlob("record shorter than an X/Y/Z triple".to_string()).into());
    }
    let mut cursor = payload;
    let x = cursor.read_f64::<LittleEndian>()?;
    let y = cursor.read_f64::<LittleEndian>()?;
    let z = cursor.read_f64::<LittleEndian>()?;
    Ok(Point::new(x, y, z))
}

pub(crate) fn write_record(out: &mut Vec<u8>, normalized: u64, payload: &[u8]) {
    out.write_u64::<LittleEndian>(normalized).unwrap();
    out.extend_from_slice(payload);
}
